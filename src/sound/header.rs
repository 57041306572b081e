//! ADX container header parser.
//!
//! Decodes the fixed 0x2C-byte header plus, for loop-type 3/4 streams, the
//! loop metadata block that follows it, then confirms the `(c)CRI` marker
//! that separates header from coded samples. Field offsets and the coercion
//! rule for a malformed `loop_enabled` flag are taken directly from
//! `adx_parse` in the reference SDL_mixer ADX codec.

use super::be::{be16, be32};
use super::byte_source::ByteSource;
use super::error::{AdxError, AdxResult};

const HEADER_SIZE: usize = 0x2C;
const SIGNATURE: u8 = 0x80;
const CRI_MARKER: &[u8; 6] = b"(c)CRI";

const ADDR_SAMPLE_OFFSET_PTR: usize = 0x02;
const ADDR_CHUNK_SIZE: usize = 0x05;
const ADDR_CHANNELS: usize = 0x07;
const ADDR_SAMPLE_RATE: usize = 0x08;
const ADDR_TOTAL_SAMPLES: usize = 0x0C;
const ADDR_LOOP_TYPE: usize = 0x12;

const ADDR_LOOP_BASE_TYPE3: usize = 0x18;
const TYPE4_SHIFT: usize = 0x0C;

/// Intra-stream loop metadata, present only for `loop_type` 3 or 4 streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopInfo {
    pub enabled: bool,
    pub sample_start: u32,
    pub byte_start: u32,
    pub sample_end: u32,
    pub byte_end: u32,
    pub samples: u32,
}

/// Parsed, immutable ADX stream format parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdxHeader {
    pub sample_offset: u32,
    pub chunk_size: u8,
    pub channels: u8,
    pub sample_rate: u32,
    pub total_samples: u32,
    pub loop_type: u8,
    pub loop_info: Option<LoopInfo>,
}

impl AdxHeader {
    /// Offset of the first coded byte, immediately after the `(c)CRI` marker.
    pub fn data_offset(&self) -> u32 {
        self.sample_offset + CRI_MARKER.len() as u32
    }

    /// Bytes per one frame group (one ADX frame per channel).
    pub fn frame_group_bytes(&self) -> usize {
        self.chunk_size as usize * self.channels as usize
    }

    /// Decoded PCM samples (per channel) produced by one frame of this
    /// stream's `chunk_size`.
    pub fn samples_per_frame(&self) -> u32 {
        2 * (self.chunk_size as u32 - 2)
    }
}

fn invalid(reason: &'static str) -> AdxError {
    AdxError::InvalidHeader { reason }
}

fn read_loop_block(buf: &[u8], base: usize) -> LoopInfo {
    let raw_enabled = be32(&buf[base..base + 4]);
    let enabled = raw_enabled == 1;
    let sample_start = be32(&buf[base + 4..base + 8]);
    let byte_start = be32(&buf[base + 8..base + 12]);
    let sample_end = be32(&buf[base + 12..base + 16]);
    let byte_end = be32(&buf[base + 16..base + 20]);
    let samples = if enabled {
        sample_end.wrapping_sub(sample_start)
    } else {
        0
    };
    LoopInfo {
        enabled,
        sample_start,
        byte_start,
        sample_end,
        byte_end,
        samples,
    }
}

/// Parse an ADX header from `src`, leaving `src` positioned at the first
/// coded byte (`header.data_offset()`) on success.
pub fn parse_header<S: ByteSource + ?Sized>(src: &mut S) -> AdxResult<AdxHeader> {
    src.seek_absolute(0).map_err(AdxError::SourceIo)?;

    let mut buf = vec![0u8; HEADER_SIZE];
    if src.read_some(&mut buf).map_err(AdxError::SourceIo)? != HEADER_SIZE {
        return Err(invalid("truncated header"));
    }
    if buf[0] != SIGNATURE {
        return Err(invalid("bad signature"));
    }

    let sample_offset = be16(&buf[ADDR_SAMPLE_OFFSET_PTR..])
        .checked_sub(2)
        .ok_or_else(|| invalid("bad sample-offset pointer"))? as u32;
    let chunk_size = buf[ADDR_CHUNK_SIZE];
    let channels = buf[ADDR_CHANNELS];
    let sample_rate = be32(&buf[ADDR_SAMPLE_RATE..]);
    let total_samples = be32(&buf[ADDR_TOTAL_SAMPLES..]);
    let loop_type = buf[ADDR_LOOP_TYPE];

    if chunk_size < 3 {
        return Err(invalid("chunk_size too small"));
    }
    if channels != 1 && channels != 2 {
        return Err(invalid("unsupported channel count"));
    }
    if sample_rate == 0 {
        return Err(invalid("zero sample rate"));
    }

    // Type-4 loop metadata sits 0x0C further in than type-3's and past the
    // fixed 0x2C-byte prefix we've already read; pull in the extra bytes
    // (contiguous, since the source is still positioned right after `buf`).
    let loop_base = match loop_type {
        3 => Some(ADDR_LOOP_BASE_TYPE3),
        4 => Some(ADDR_LOOP_BASE_TYPE3 + TYPE4_SHIFT),
        _ => None,
    };
    if let Some(base) = loop_base {
        let needed_end = base + 20;
        if needed_end > buf.len() {
            let extra = needed_end - buf.len();
            let mut tail = vec![0u8; extra];
            if src.read_some(&mut tail).map_err(AdxError::SourceIo)? != extra {
                return Err(invalid("truncated loop metadata"));
            }
            buf.extend_from_slice(&tail);
        }
    }

    let loop_info = loop_base.map(|base| read_loop_block(&buf, base));

    src.seek_absolute(sample_offset as u64)
        .map_err(AdxError::SourceIo)?;
    let mut marker = [0u8; 6];
    if src.read_some(&mut marker).map_err(AdxError::SourceIo)? != marker.len() || &marker != CRI_MARKER {
        return Err(invalid("missing (c)CRI marker"));
    }

    Ok(AdxHeader {
        sample_offset,
        chunk_size,
        channels,
        sample_rate,
        total_samples,
        loop_type,
        loop_info,
    })
}

/// Synthetic ADX byte-buffer construction for tests.
///
/// Not `#[cfg(test)]`: the crate's own integration tests live in `tests/`,
/// a separate crate that links against a normally-built `cri_adx`, so a
/// test-only module would be invisible to them. Kept public and undocumented
/// beyond this module's doc comment rather than hidden, matching how small
/// "build me a fixture" helpers are exposed elsewhere in the reference
/// codebase's test suites.
pub mod test_support {
    use super::*;

    /// Build a minimal, well-formed ADX header + `(c)CRI` marker + `body`
    /// coded bytes, for use by this module's and the streaming engine's
    /// tests.
    pub fn build_adx(
        chunk_size: u8,
        channels: u8,
        sample_rate: u32,
        total_samples: u32,
        loop_type3: Option<(bool, u32, u32, u32, u32)>,
        body: &[u8],
    ) -> Vec<u8> {
        build_adx_raw(chunk_size, channels, sample_rate, total_samples, loop_type3, None, body)
    }

    /// Like [`build_adx`] but also able to fill in a type-4 (shifted) loop
    /// block, growing the header past the fixed 0x2C-byte prefix the way a
    /// real type-4 encoder would.
    pub fn build_adx_raw(
        chunk_size: u8,
        channels: u8,
        sample_rate: u32,
        total_samples: u32,
        loop_type3: Option<(bool, u32, u32, u32, u32)>,
        loop_type4: Option<(bool, u32, u32, u32, u32)>,
        body: &[u8],
    ) -> Vec<u8> {
        let header_len = if loop_type4.is_some() {
            ADDR_LOOP_BASE_TYPE3 + TYPE4_SHIFT + 20
        } else {
            HEADER_SIZE
        };
        let mut h = vec![0u8; header_len];
        h[0] = SIGNATURE;
        // The stored pointer is the (c)CRI position plus 2 (`parse_header`
        // subtracts 2 back out); the marker itself sits right at `header_len`
        // since there's no extra padding.
        let cri_pos: u16 = header_len as u16 + 2;
        h[ADDR_SAMPLE_OFFSET_PTR] = (cri_pos >> 8) as u8;
        h[ADDR_SAMPLE_OFFSET_PTR + 1] = (cri_pos & 0xFF) as u8;
        h[ADDR_CHUNK_SIZE] = chunk_size;
        h[ADDR_CHANNELS] = channels;
        h[ADDR_SAMPLE_RATE..ADDR_SAMPLE_RATE + 4].copy_from_slice(&sample_rate.to_be_bytes());
        h[ADDR_TOTAL_SAMPLES..ADDR_TOTAL_SAMPLES + 4].copy_from_slice(&total_samples.to_be_bytes());
        if let Some((enabled, samp_start, byte_start, samp_end, byte_end)) = loop_type3 {
            h[ADDR_LOOP_TYPE] = 3;
            let base = ADDR_LOOP_BASE_TYPE3;
            h[base..base + 4].copy_from_slice(&(enabled as u32).to_be_bytes());
            h[base + 4..base + 8].copy_from_slice(&samp_start.to_be_bytes());
            h[base + 8..base + 12].copy_from_slice(&byte_start.to_be_bytes());
            h[base + 12..base + 16].copy_from_slice(&samp_end.to_be_bytes());
            h[base + 16..base + 20].copy_from_slice(&byte_end.to_be_bytes());
        }
        if let Some((enabled, samp_start, byte_start, samp_end, byte_end)) = loop_type4 {
            h[ADDR_LOOP_TYPE] = 4;
            let base = ADDR_LOOP_BASE_TYPE3 + TYPE4_SHIFT;
            h[base..base + 4].copy_from_slice(&(enabled as u32).to_be_bytes());
            h[base + 4..base + 8].copy_from_slice(&samp_start.to_be_bytes());
            h[base + 8..base + 12].copy_from_slice(&byte_start.to_be_bytes());
            h[base + 12..base + 16].copy_from_slice(&samp_end.to_be_bytes());
            h[base + 16..base + 20].copy_from_slice(&byte_end.to_be_bytes());
        }

        let mut out = h;
        out.extend_from_slice(CRI_MARKER);
        out.extend_from_slice(body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::build_adx;
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_valid_mono_header() {
        let bytes = build_adx(18, 1, 11025, 64, None, &[0u8; 18]);
        let mut src = Cursor::new(bytes);
        let header = parse_header(&mut src).unwrap();
        assert_eq!(header.chunk_size, 18);
        assert_eq!(header.channels, 1);
        assert_eq!(header.sample_rate, 11025);
        assert_eq!(header.total_samples, 64);
        assert_eq!(header.loop_type, 0);
        assert!(header.loop_info.is_none());
        assert_eq!(ByteSource::tell(&mut src).unwrap(), header.data_offset() as u64);
    }

    #[test]
    fn test_parse_rejects_bad_signature() {
        let mut bytes = build_adx(18, 1, 11025, 64, None, &[]);
        bytes[0] = 0x7F;
        let mut src = Cursor::new(bytes);
        let err = parse_header(&mut src).unwrap_err();
        assert!(matches!(err, AdxError::InvalidHeader { .. }));
    }

    #[test]
    fn test_parse_rejects_missing_cri_marker() {
        let mut bytes = build_adx(18, 1, 11025, 64, None, &[]);
        let cri_pos = HEADER_SIZE;
        bytes[cri_pos] = b'X';
        let mut src = Cursor::new(bytes);
        let err = parse_header(&mut src).unwrap_err();
        assert!(matches!(err, AdxError::InvalidHeader { .. }));
    }

    #[test]
    fn test_parse_rejects_sample_offset_pointer_underflow() {
        let mut bytes = build_adx(18, 1, 11025, 64, None, &[0u8; 18]);
        bytes[ADDR_SAMPLE_OFFSET_PTR] = 0;
        bytes[ADDR_SAMPLE_OFFSET_PTR + 1] = 1;
        let mut src = Cursor::new(bytes);
        let err = parse_header(&mut src).unwrap_err();
        assert!(matches!(err, AdxError::InvalidHeader { .. }));
    }

    #[test]
    fn test_parse_rejects_truncated_header() {
        let bytes = vec![0x80u8; 10];
        let mut src = Cursor::new(bytes);
        let err = parse_header(&mut src).unwrap_err();
        assert!(matches!(err, AdxError::InvalidHeader { .. }));
    }

    #[test]
    fn test_loop_type3_enabled() {
        let bytes = build_adx(18, 2, 44100, 1000, Some((true, 10, 200, 110, 2000)), &[]);
        let mut src = Cursor::new(bytes);
        let header = parse_header(&mut src).unwrap();
        let loop_info = header.loop_info.unwrap();
        assert!(loop_info.enabled);
        assert_eq!(loop_info.sample_start, 10);
        assert_eq!(loop_info.byte_start, 200);
        assert_eq!(loop_info.sample_end, 110);
        assert_eq!(loop_info.byte_end, 2000);
        assert_eq!(loop_info.samples, 100);
    }

    #[test]
    fn test_loop_enabled_coerced_false_for_invalid_flag() {
        // raw flag = 2 is neither 0 nor 1, so loop_enabled must coerce to false.
        let bytes = build_adx(18, 1, 44100, 1000, Some((false, 10, 200, 110, 2000)), &[]);
        let mut bytes = bytes;
        let base = ADDR_LOOP_BASE_TYPE3;
        bytes[base..base + 4].copy_from_slice(&2u32.to_be_bytes());
        let mut src = Cursor::new(bytes);
        let header = parse_header(&mut src).unwrap();
        let loop_info = header.loop_info.unwrap();
        assert!(!loop_info.enabled);
        assert_eq!(loop_info.samples, 0);
    }

    #[test]
    fn test_loop_type4_offsets_shifted() {
        let bytes = super::test_support::build_adx_raw(
            18,
            1,
            44100,
            1000,
            None,
            Some((true, 5, 100, 55, 900)),
            &[],
        );
        let mut src = Cursor::new(bytes);
        let header = parse_header(&mut src).unwrap();
        let loop_info = header.loop_info.unwrap();
        assert!(loop_info.enabled);
        assert_eq!(loop_info.sample_start, 5);
        assert_eq!(loop_info.byte_start, 100);
        assert_eq!(loop_info.sample_end, 55);
        assert_eq!(loop_info.byte_end, 900);
        assert_eq!(loop_info.samples, 50);
    }

    #[test]
    fn test_loop_type4_header_extends_past_fixed_prefix() {
        // A type-4 header is 56 bytes before the CRI marker, 12 bytes longer
        // than the fixed 0x2C-byte prefix `parse_header` reads up front; this
        // must not panic or misread the marker position.
        let bytes = super::test_support::build_adx_raw(
            18,
            2,
            22050,
            500,
            None,
            Some((true, 0, 0, 10, 360)),
            &[0u8; 36],
        );
        assert_eq!(bytes.len(), ADDR_LOOP_BASE_TYPE3 + TYPE4_SHIFT + 20 + CRI_MARKER.len() + 36);
        let mut src = Cursor::new(bytes);
        let header = parse_header(&mut src).unwrap();
        assert_eq!(header.loop_type, 4);
        assert_eq!(ByteSource::tell(&mut src).unwrap(), header.data_offset() as u64);
    }
}
