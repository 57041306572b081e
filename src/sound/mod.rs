//! CRI ADX ADPCM streaming decoder.

pub mod be;
pub mod byte_source;
pub mod error;
pub mod header;
pub mod interface;
pub mod predictor;
pub mod stream;
