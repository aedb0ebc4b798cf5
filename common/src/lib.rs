pub mod bit_cursor;
pub mod coded_block_pattern;
pub mod errors;
pub mod exp_golomb;
pub mod nal_unit;
pub mod nal_unit_type;

pub use bit_cursor::BitCursor;
pub use coded_block_pattern::{CodedBlockPattern, MbPrediction, CODED_BLOCK_PATTERN};
pub use errors::FormatError;
pub use nal_unit::{contains_emulation_prevention, NalUnit};
pub use nal_unit_type::NalUnitType;
