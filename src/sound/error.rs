//! Error taxonomy for the ADX decoder.
//!
//! One enum covers header parsing, streaming I/O, and allocation failure at
//! create time, mirroring how `graphics::pixmap::PixmapError` groups a
//! subsystem's failures behind a single `thiserror`-derived type rather than
//! one type per function.

use thiserror::Error;

/// Errors produced by the ADX decoder.
#[derive(Debug, Error)]
pub enum AdxError {
    /// Bad signature, truncated header, missing `(c)CRI` trailer, or any I/O
    /// failure while reading the header. The caller is not expected to branch
    /// on `reason`; it exists for logs and diagnostics only.
    #[error("invalid ADX header: {reason}")]
    InvalidHeader { reason: &'static str },

    /// Read or seek failure against the byte source during streaming or
    /// seeking.
    #[error("ADX source I/O error: {0}")]
    SourceIo(#[from] std::io::Error),

    /// Allocation failure while creating a decoder instance.
    #[error("out of memory creating ADX decoder")]
    OutOfMemory,
}

pub type AdxResult<T> = Result<T, AdxError>;
