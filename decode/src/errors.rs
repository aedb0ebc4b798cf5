use std::io;

use common::FormatError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodingError {
    #[error("An error occurred reading from the byte stream source")]
    StreamError(#[from] io::Error),

    #[error("Malformed bitstream: {0}")]
    FormatError(#[from] FormatError),

    #[error("Invalid byte stream configuration: {0}")]
    InvalidConfig(String),
}

impl DecodingError {
    /// Terminal errors end the byte stream. Anything else only invalidates the unit that caused it.
    pub fn is_terminal(&self) -> bool {
        match self {
            DecodingError::StreamError(_) | DecodingError::InvalidConfig(_) => true,
            DecodingError::FormatError(err) => matches!(err, FormatError::UnitTooLarge { .. }),
        }
    }
}
