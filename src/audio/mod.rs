pub mod decode;
pub mod filter;
pub mod source;

pub use decode::PcmBuffer;
