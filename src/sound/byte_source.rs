//! Random-access byte source abstraction consumed by the ADX decoder.
//!
//! The host mixer owns whatever concrete I/O abstraction backs a stream (a
//! file handle, a virtual filesystem entry, a memory-mapped archive member).
//! `ByteSource` is the minimal vtable this decoder needs from it: bounded
//! reads, absolute seeks, and a position query. A blanket implementation
//! over anything that already implements `Read + Seek` covers the common
//! case of a plain `File` or in-memory `Cursor` without the host needing to
//! write an adapter by hand.

use std::io::{self, Read, Seek, SeekFrom};

/// A random-access byte source.
///
/// Implementors are expected to be cheap to seek and read from synchronously;
/// the streaming engine calls these methods from the real-time audio
/// callback and must never block on them for long.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes, returning the number of bytes actually
    /// read (which may be less than `buf.len()` at end of stream).
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Seek to an absolute byte offset from the start of the source.
    fn seek_absolute(&mut self, offset: u64) -> io::Result<u64>;

    /// Return the current byte offset from the start of the source.
    fn tell(&mut self) -> io::Result<u64>;

    /// Release any resources held by the source (file descriptors, etc).
    ///
    /// Called by the decoder on delete iff it was created with
    /// `owns_source = true`. Implementors that have nothing to release may
    /// leave this a no-op.
    fn close(&mut self) {}

    /// Read exactly `buf.len()` bytes, treating a short read as a non-error
    /// "short read" the caller can interpret as EOF (§4.5's "short read").
    ///
    /// Returns the number of bytes actually read; this is `buf.len()` on a
    /// full read and less than that on a short read or true EOF.
    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match self.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

/// Blanket adapter: any `Read + Seek` type is a valid [`ByteSource`].
impl<T: Read + Seek> ByteSource for T {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn seek_absolute(&mut self, offset: u64) -> io::Result<u64> {
        self.seek(SeekFrom::Start(offset))
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_cursor_read_some_full() {
        let mut src = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let mut buf = [0u8; 3];
        let n = src.read_some(&mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn test_cursor_read_some_short() {
        let mut src = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 8];
        let n = src.read_some(&mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_cursor_seek_and_tell() {
        let mut src = Cursor::new(vec![0u8; 16]);
        assert_eq!(ByteSource::seek_absolute(&mut src, 10).unwrap(), 10);
        assert_eq!(ByteSource::tell(&mut src).unwrap(), 10);
    }
}
