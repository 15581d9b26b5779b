//! Actor script decoder: typed reads over a script byte buffer.

pub mod decoder;
pub mod encoder;

pub use decoder::{DecodeError, DecodeResult, Decoder};
pub use encoder::Encoder;
