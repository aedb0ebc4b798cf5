use std::fmt;

use serde::Serialize;

use crate::errors::FormatError;

/// `nal_unit_type` values from Table 7-1 up to and including filler data. Anything past `12` is
/// rejected by the header parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NalUnitType {
    Unspecified,
    CodedSliceNonIDRPicture,
    CodedSliceDataPartitionA,
    CodedSliceDataPartitionB,
    CodedSliceDataPartitionC,
    CodedSliceIDRPicture,
    SupplementalEnhancementInformation,
    SequenceParameterSet,
    PictureParameterSet,
    AccessUnitDelimiter,
    SequenceEnd,
    StreamEnd,
    FillerData,
}

impl NalUnitType {
    pub const MAX_SUPPORTED: u8 = 12;

    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Slice and slice data partition units belong to the video coding layer.
    pub fn is_vcl(&self) -> bool {
        matches!(
            self,
            NalUnitType::CodedSliceNonIDRPicture
                | NalUnitType::CodedSliceDataPartitionA
                | NalUnitType::CodedSliceDataPartitionB
                | NalUnitType::CodedSliceDataPartitionC
                | NalUnitType::CodedSliceIDRPicture
        )
    }
}

impl TryFrom<u8> for NalUnitType {
    type Error = FormatError;

    fn try_from(nal_unit_type: u8) -> Result<Self, Self::Error> {
        Ok(match nal_unit_type {
            0 => NalUnitType::Unspecified,
            1 => NalUnitType::CodedSliceNonIDRPicture,
            2 => NalUnitType::CodedSliceDataPartitionA,
            3 => NalUnitType::CodedSliceDataPartitionB,
            4 => NalUnitType::CodedSliceDataPartitionC,
            5 => NalUnitType::CodedSliceIDRPicture,
            6 => NalUnitType::SupplementalEnhancementInformation,
            7 => NalUnitType::SequenceParameterSet,
            8 => NalUnitType::PictureParameterSet,
            9 => NalUnitType::AccessUnitDelimiter,
            10 => NalUnitType::SequenceEnd,
            11 => NalUnitType::StreamEnd,
            12 => NalUnitType::FillerData,
            _ => {
                return Err(FormatError::InvalidNalHeader(format!(
                    "nal_unit_type {nal_unit_type} is greater than {}",
                    Self::MAX_SUPPORTED
                )))
            }
        })
    }
}

impl fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NalUnitType::Unspecified => "Unspecified",
            NalUnitType::CodedSliceNonIDRPicture => "Slice",
            NalUnitType::CodedSliceDataPartitionA => "SliceDPA",
            NalUnitType::CodedSliceDataPartitionB => "SliceDPB",
            NalUnitType::CodedSliceDataPartitionC => "SliceDPC",
            NalUnitType::CodedSliceIDRPicture => "IDR",
            NalUnitType::SupplementalEnhancementInformation => "SEI",
            NalUnitType::SequenceParameterSet => "SPS",
            NalUnitType::PictureParameterSet => "PPS",
            NalUnitType::AccessUnitDelimiter => "AUD",
            NalUnitType::SequenceEnd => "EndOfSeq",
            NalUnitType::StreamEnd => "EndOfStream",
            NalUnitType::FillerData => "Filler",
        };
        f.write_str(name)
    }
}
