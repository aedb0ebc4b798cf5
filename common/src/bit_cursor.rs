use crate::errors::FormatError;

/// `BitCursor` reads an `RBSP` one bit at a time, most significant bit first.
///
/// The position only ever moves forward. `peek_bit` and `more_rbsp_data` look ahead without
/// consuming anything.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    bit_offset: usize,
}

impl<'a> BitCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_offset: 0,
        }
    }

    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    pub fn bits_left(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.bit_offset)
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.bit_offset % 8 == 0
    }

    fn truncated(&self) -> FormatError {
        FormatError::TruncatedBits {
            bit_offset: self.bit_offset,
        }
    }

    fn bit_at(&self, offset: usize) -> Option<bool> {
        let byte = self.data.get(offset / 8)?;
        Some((byte >> (7 - offset % 8)) & 1 == 1)
    }

    pub fn peek_bit(&self) -> Result<bool, FormatError> {
        self.bit_at(self.bit_offset).ok_or_else(|| self.truncated())
    }

    pub fn read_bit(&mut self) -> Result<bool, FormatError> {
        let bit = self.peek_bit()?;
        self.bit_offset += 1;
        Ok(bit)
    }

    /// Reads `n` bits as an unsigned integer. `n` may be at most 32; reading zero bits yields 0.
    pub fn read_bits(&mut self, n: u32) -> Result<u32, FormatError> {
        if n > 32 {
            return Err(FormatError::UnsupportedSyntax(format!(
                "cannot read {n} bits into a 32-bit value"
            )));
        }
        if n as usize > self.bits_left() {
            return Err(self.truncated());
        }

        let mut value: u32 = 0;
        let mut remaining = n;

        while remaining > 0 {
            let byte = self.data[self.bit_offset / 8];
            let available = 8 - (self.bit_offset % 8) as u32;
            let take = remaining.min(available);

            let shift = available - take;
            let mask = ((1u16 << take) - 1) as u8;
            let bits = (byte >> shift) & mask;

            value = (value << take) | u32::from(bits);

            self.bit_offset += take as usize;
            remaining -= take;
        }

        Ok(value)
    }

    pub fn read_u8(&mut self, n: u32) -> Result<u8, FormatError> {
        debug_assert!(n <= 8);
        Ok(self.read_bits(n)? as u8)
    }

    pub fn read_u16(&mut self, n: u32) -> Result<u16, FormatError> {
        debug_assert!(n <= 16);
        Ok(self.read_bits(n)? as u16)
    }

    pub fn skip_bits(&mut self, n: usize) -> Result<(), FormatError> {
        if n > self.bits_left() {
            return Err(self.truncated());
        }
        self.bit_offset += n;
        Ok(())
    }

    /// `more_rbsp_data` from 7.2: true while there is payload before the `rbsp_stop_one_bit`, i.e.
    /// while the last set bit of the buffer lies beyond the current position.
    pub fn more_rbsp_data(&self) -> bool {
        let Some(last_byte) = self.data.iter().rposition(|&b| b != 0) else {
            return false;
        };
        let stop_bit = last_byte * 8 + 7 - self.data[last_byte].trailing_zeros() as usize;

        self.bit_offset < stop_bit
    }
}
