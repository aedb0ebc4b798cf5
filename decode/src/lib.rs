pub mod byte_stream;
pub mod decoder;
pub mod errors;
pub mod parameter_sets;
pub mod pps;
pub mod sps;
pub mod vui;

pub use byte_stream::{ByteStream, ByteStreamConfig};
pub use decoder::{DecodeSummary, H264Decoder, UnitInfo};
pub use errors::DecodingError;
pub use parameter_sets::ParameterSets;
pub use pps::{Pps, SliceGroupMap};
pub use sps::{ChromaFormat, FrameCropping, PicOrderCnt, Sps};
pub use vui::{HrdParameters, VuiParameters};
