use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("NAL unit exceeds the maximum buffered size of {max_unit_size} bytes before a start code was found")]
    UnitTooLarge { max_unit_size: usize },

    #[error("Invalid NAL unit header: {0}")]
    InvalidNalHeader(String),

    #[error("Ran out of bits at bit offset {bit_offset}")]
    TruncatedBits { bit_offset: usize },

    #[error("Unsupported syntax: {0}")]
    UnsupportedSyntax(String),
}
