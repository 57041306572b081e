//! Streaming engine: owns a parsed header, a byte source, predictor state
//! per channel, and a small decoded-PCM staging buffer.
//!
//! Shaped after `sound::ogg::OggDecoder`'s `sample_buffer`/`buffer_pos`
//! staging pattern and `sound::null::NullDecoder`'s position bookkeeping, but
//! the staging buffer here is a `VecDeque<u8>` ring rather than a `Vec` plus
//! a scan cursor (Open Question 1: this is an implementation freedom, not an
//! observable-behavior change).

use std::collections::VecDeque;

use crate::config::DecoderConfig;

use super::byte_source::ByteSource;
use super::error::{AdxError, AdxResult};
use super::header::{parse_header, AdxHeader};
use super::predictor::{decode_frame, Predictor};

/// Why the staging buffer was just refilled, purely for `log::trace!`
/// breadcrumbs (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EofAction {
    LoopIntraStream,
    LoopFromStart,
    Stopped,
}

/// A single open ADX stream, bound to one byte source for its lifetime.
#[derive(Debug)]
pub struct AdxStream<S: ByteSource> {
    source: S,
    owns_source: bool,
    header: AdxHeader,
    config: DecoderConfig,
    predictors: [Predictor; 2],
    staging: VecDeque<u8>,
    playing: bool,
    paused: bool,
    loop_forever: bool,
    remaining_samples: u32,
    /// Scratch buffers reused across frame groups (§9: no per-frame heap
    /// allocation beyond what was sized at creation). `frame_scratch` holds
    /// the raw coded bytes for one frame group; `left_scratch`/`right_scratch`
    /// hold decoded samples, one channel each (mono only uses the left one).
    frame_scratch: Vec<u8>,
    left_scratch: Vec<i16>,
    right_scratch: Vec<i16>,
}

impl<S: ByteSource> AdxStream<S> {
    /// Parse `source`'s header and return a stream positioned to play from
    /// the first coded byte. `owns_source` controls whether `delete` (via
    /// `Drop`, see below) closes the source.
    pub fn create_from_source(source: S, owns_source: bool) -> AdxResult<Self> {
        Self::create_from_source_with_config(source, owns_source, DecoderConfig::default())
    }

    pub fn create_from_source_with_config(
        mut source: S,
        owns_source: bool,
        config: DecoderConfig,
    ) -> AdxResult<Self> {
        let header = match parse_header(&mut source) {
            Ok(h) => h,
            Err(e) => {
                log::warn!("ADX header parse failed: {e}");
                return Err(e);
            }
        };
        if let Some(loop_info) = header.loop_info {
            if !loop_info.enabled {
                log::warn!("ADX loop flag coerced to disabled (malformed raw value)");
            }
        }
        log::debug!(
            "ADX stream opened: {} Hz, {} ch, chunk_size={}, {} samples, loop_type={}",
            header.sample_rate,
            header.channels,
            header.chunk_size,
            header.total_samples,
            header.loop_type,
        );
        let scratch_len = header.samples_per_frame() as usize;
        if scratch_len > config.staging_capacity_frames {
            log::warn!(
                "configured staging_capacity_frames ({}) is smaller than this stream's \
                 per-frame-group sample count ({}); the staging buffer will momentarily \
                 exceed the configured ceiling on every refill",
                config.staging_capacity_frames,
                scratch_len,
            );
        }
        Ok(Self {
            source,
            owns_source,
            frame_scratch: vec![0u8; header.frame_group_bytes()],
            header,
            config,
            predictors: [Predictor::new(), Predictor::new()],
            staging: VecDeque::with_capacity(
                config.staging_capacity_frames * header.channels as usize * 2,
            ),
            playing: false,
            paused: false,
            loop_forever: false,
            remaining_samples: 0,
            left_scratch: vec![0i16; scratch_len],
            right_scratch: vec![0i16; scratch_len],
        })
    }

    pub fn header(&self) -> &AdxHeader {
        &self.header
    }

    fn bytes_per_pcm_second(&self) -> u64 {
        self.header.sample_rate as u64 * self.header.channels as u64 * 2
    }

    /// §4.7: arm playback. `play_count == -1` loops forever; any other value
    /// plays once regardless of its magnitude (the distilled spec does not
    /// define finite repeat counts beyond 1).
    pub fn play(&mut self, play_count: i32) {
        self.loop_forever = play_count == -1;
        self.remaining_samples = self.header.total_samples;
        self.playing = true;
        self.paused = false;
    }

    pub fn stop(&mut self) {
        log::debug!("ADX stream stopped");
        self.playing = false;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        log::debug!("ADX stream paused");
        self.paused = true;
    }

    pub fn resume(&mut self) {
        log::debug!("ADX stream resumed");
        self.paused = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// §4.6: reposition to `position_seconds`. Resets predictor state and
    /// drains the staging buffer, as any seek does.
    ///
    /// This is a PCM-equivalent byte offset, not frame-aligned: since ADX
    /// frame groups are `chunk_size * channels` bytes, seeking to a time
    /// that does not land on a frame-group boundary leaves the source
    /// mid-frame and the next decoded frame group will be garbled until the
    /// following one. Callers that need sample-accurate seeking must round
    /// to a frame-group boundary themselves.
    pub fn seek(&mut self, position_seconds: f64) -> AdxResult<()> {
        self.predictors = [Predictor::new(), Predictor::new()];
        self.staging.clear();
        let target = (position_seconds * self.bytes_per_pcm_second() as f64) as u64
            + self.header.data_offset() as u64;
        log::debug!("ADX seek to {position_seconds}s (byte offset {target}), predictor reset");
        self.source
            .seek_absolute(target)
            .map(|_| ())
            .map_err(AdxError::SourceIo)
    }

    /// §4.6: current playback position in seconds, or `-1.0` on a source
    /// error reading the current offset.
    pub fn tell(&mut self) -> f64 {
        match self.source.tell() {
            Ok(p) => {
                let data_start = self.header.data_offset() as u64;
                let elapsed = p.saturating_sub(data_start);
                elapsed as f64 / self.bytes_per_pcm_second() as f64
            }
            Err(_) => -1.0,
        }
    }

    pub fn duration(&self) -> f64 {
        self.header.total_samples as f64 / self.header.sample_rate as f64
    }

    /// §4.5: fill at most `dst.len()` bytes, returning the number produced.
    /// Unfilled trailing bytes on terminal EOF are zeroed; `dst` is always
    /// fully zeroed up front so every early-return path satisfies that.
    pub fn get_audio(&mut self, dst: &mut [u8]) -> usize {
        dst.fill(0);
        if !self.playing || self.paused {
            return 0;
        }

        let mut filled = 0;
        while filled < dst.len() {
            if self.staging.is_empty() {
                match self.refill_staging() {
                    Some(EofAction::Stopped) => {
                        self.playing = false;
                        return filled;
                    }
                    Some(_) | None => {}
                }
                if self.staging.is_empty() {
                    // remaining_samples hit zero without a short read (e.g.
                    // total_samples == 0); treat as terminal EOF.
                    self.playing = false;
                    return filled;
                }
            }
            let n = std::cmp::min(dst.len() - filled, self.staging.len());
            for slot in &mut dst[filled..filled + n] {
                *slot = self.staging.pop_front().unwrap();
            }
            filled += n;
        }
        filled
    }

    /// Attempt to read and decode one frame group into the staging buffer.
    /// Returns `Some(EofAction::Stopped)` if playback ended with no loop to
    /// take; otherwise decodes a frame group (retrying once after a loop
    /// wrap repositions the source) and returns `None`.
    fn refill_staging(&mut self) -> Option<EofAction> {
        // At most one wrap attempt per call: a wrap always leaves
        // `remaining_samples > 0` (either `total_samples` or `loop_samples`,
        // both validated to be meaningful at header-parse/config time), so a
        // second EOF in the same call means a genuinely empty loop target.
        for _ in 0..2 {
            if self.remaining_samples == 0 {
                match self.handle_eof() {
                    EofAction::Stopped => return Some(EofAction::Stopped),
                    _ => continue,
                }
            }

            let frame_bytes = self.header.frame_group_bytes();
            let n = match self.source.read_some(&mut self.frame_scratch[..frame_bytes]) {
                Ok(n) => n,
                Err(_) => return Some(EofAction::Stopped),
            };
            if n < frame_bytes {
                match self.handle_eof() {
                    EofAction::Stopped => return Some(EofAction::Stopped),
                    _ => continue,
                }
            }

            let samples_per_frame = self.header.samples_per_frame();
            let w = self.remaining_samples.min(samples_per_frame) as usize;
            let chunk_size = self.header.chunk_size as usize;

            if self.header.channels == 1 {
                decode_frame(
                    &mut self.predictors[0],
                    &self.frame_scratch[..chunk_size],
                    &mut self.left_scratch,
                );
                for &s in &self.left_scratch[..w] {
                    self.staging.extend(s.to_le_bytes());
                }
            } else {
                // `chunk_size <= 255` (§9), so a 255-byte stack buffer per
                // channel always fits one frame; this sidesteps borrowing
                // `frame_scratch` and `{left,right}_scratch` together
                // without a heap copy.
                let mut left_bytes = [0u8; 255];
                let mut right_bytes = [0u8; 255];
                left_bytes[..chunk_size].copy_from_slice(&self.frame_scratch[..chunk_size]);
                right_bytes[..chunk_size]
                    .copy_from_slice(&self.frame_scratch[chunk_size..frame_bytes]);
                decode_frame(&mut self.predictors[0], &left_bytes[..chunk_size], &mut self.left_scratch);
                decode_frame(&mut self.predictors[1], &right_bytes[..chunk_size], &mut self.right_scratch);
                for i in 0..w {
                    self.staging.extend(self.left_scratch[i].to_le_bytes());
                    self.staging.extend(self.right_scratch[i].to_le_bytes());
                }
            }

            self.remaining_samples -= w as u32;
            return None;
        }
        Some(EofAction::Stopped)
    }

    fn handle_eof(&mut self) -> EofAction {
        if self.loop_forever {
            if let Some(loop_info) = self.header.loop_info.filter(|l| l.enabled) {
                if self.source.seek_absolute(loop_info.byte_start as u64).is_err() {
                    log::warn!("ADX EOF: seek to intra-stream loop point failed, stopping");
                    return EofAction::Stopped;
                }
                log::debug!("ADX EOF: wrapping to intra-stream loop, predictor preserved");
                self.remaining_samples = loop_info.samples;
                return EofAction::LoopIntraStream;
            }
            if self
                .source
                .seek_absolute(self.header.data_offset() as u64)
                .is_err()
            {
                log::warn!("ADX EOF: seek to stream start failed, stopping");
                return EofAction::Stopped;
            }
            log::debug!("ADX EOF: wrapping to start, predictor reset");
            self.predictors = [Predictor::new(), Predictor::new()];
            self.remaining_samples = self.header.total_samples;
            return EofAction::LoopFromStart;
        }
        log::debug!("ADX EOF: no loop requested, stopping");
        EofAction::Stopped
    }
}

impl<S> Drop for AdxStream<S>
where
    S: ByteSource,
{
    fn drop(&mut self) {
        if self.owns_source {
            self.source.close();
        }
    }
}
