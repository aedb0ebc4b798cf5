//! Exp-Golomb parsing (clause 9.1): `ue(v)`, `se(v)` and `me(v)`.

use crate::bit_cursor::BitCursor;
use crate::coded_block_pattern::{coded_block_pattern, MbPrediction};
use crate::errors::FormatError;

impl BitCursor<'_> {
    /// `ue(v)`: `codeNum = 2^leadingZeroBits - 1 + read_bits(leadingZeroBits)`.
    pub fn read_ue(&mut self) -> Result<u32, FormatError> {
        let mut leading_zero_bits = 0u32;
        while !self.read_bit()? {
            leading_zero_bits += 1;
            if leading_zero_bits > 31 {
                return Err(FormatError::UnsupportedSyntax(format!(
                    "exp-golomb code with more than 31 leading zero bits ending at bit offset {}",
                    self.bit_offset()
                )));
            }
        }

        if leading_zero_bits == 0 {
            return Ok(0);
        }

        let suffix = self.read_bits(leading_zero_bits)?;
        Ok((1u32 << leading_zero_bits) - 1 + suffix)
    }

    /// `se(v)`: `codeNum` k maps to `(-1)^(k+1) * Ceil(k / 2)`.
    pub fn read_se(&mut self) -> Result<i32, FormatError> {
        let code_num = self.read_ue()?;
        let magnitude = code_num.div_ceil(2) as i64;

        let value = match code_num & 1 {
            1 => magnitude,
            _ => -magnitude,
        };

        Ok(value as i32)
    }

    /// `me(v)`: `codeNum` mapped through Table 9-4 to a `coded_block_pattern`.
    pub fn read_me(&mut self, prediction: MbPrediction) -> Result<u8, FormatError> {
        let code_num = self.read_ue()?;

        coded_block_pattern(code_num)
            .map(|entry| entry.select(prediction))
            .ok_or_else(|| {
                FormatError::UnsupportedSyntax(format!(
                    "mapped exp-golomb codeNum {code_num} is outside the coded_block_pattern table"
                ))
            })
    }
}
