use crate::bit_cursor::BitCursor;
use crate::errors::FormatError;
use crate::nal_unit_type::NalUnitType;

/// `NalUnit` is a syntax structure containing an indication of the type of data to follow and bytes
/// containing that data in the form of an `RBSP` interspersed as necessary with
/// `EMULATION_PREVENTION_BYTE`.
///
/// The payload is kept exactly as it appeared in the byte stream. Emulation prevention bytes are
/// not removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalUnit {
    /// `nal_unit_type` specifies the type of `RBSP` data structure contained in the NAL unit.
    nal_unit_type: NalUnitType,

    /// `nal_ref_idc` not equal to 0 specifies that the content of the NAL unit contains a sequence
    /// parameter set, a picture parameter set, or a slice (data partition) of a reference picture.
    ///
    /// `nal_ref_idc` shall be equal to 0 for all NAL units having nal_unit_type equal to 6, 9, 10,
    /// 11, or 12.
    nal_ref_idc: u8,

    payload: Vec<u8>,
}

impl NalUnit {
    /// A unique sequence of three bytes equal to `0x000001` embedded in the byte stream as a prefix
    /// to each `NalUnit`. The location of a `START_CODE_PREFIX` can be used by a decoder to identify
    /// the beginning of a new `NalUnit` and the end of a previous one.
    pub const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

    /// `zero_byte` followed by `START_CODE_PREFIX`.
    pub const LONG_START_CODE_PREFIX: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

    /// A byte equal to 0x03 that may be present within a `NalUnit`.
    /// The presence of this byte ensures no sequence of consecutive byte-aligned bytes in the
    /// `NalUnit` contains a `START_CODE_PREFIX`.
    pub const EMULATION_PREVENTION_BYTE: u8 = 0x03;

    /// Parses the one byte header of a demuxed unit. Everything after it becomes the payload.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        let Some((_, payload)) = data.split_first() else {
            return Err(FormatError::InvalidNalHeader(
                "NAL unit is empty, expected a header byte".to_string(),
            ));
        };

        let mut cursor = BitCursor::new(data);

        let forbidden_zero_bit = cursor.read_bit()?;
        if forbidden_zero_bit {
            return Err(FormatError::InvalidNalHeader(
                "forbidden_zero_bit is set".to_string(),
            ));
        }

        let nal_ref_idc = cursor.read_u8(2)?;
        let nal_unit_type = NalUnitType::try_from(cursor.read_u8(5)?)?;

        Ok(Self {
            nal_unit_type,
            nal_ref_idc,
            payload: payload.to_vec(),
        })
    }

    pub fn nal_unit_type(&self) -> NalUnitType {
        self.nal_unit_type
    }

    pub fn nal_ref_idc(&self) -> u8 {
        self.nal_ref_idc
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Reports whether `payload` still carries an `EMULATION_PREVENTION_BYTE` escape (`0x000003`).
pub fn contains_emulation_prevention(payload: &[u8]) -> bool {
    payload
        .windows(3)
        .any(|w| w == [0x00, 0x00, NalUnit::EMULATION_PREVENTION_BYTE])
}
