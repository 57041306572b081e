//! Decoder-wide tunables.
//!
//! Unlike the distilled spec, which hard-codes a `2048`-sample staging
//! ceiling and a fixed 0-128 -> 0-255 volume curve, this crate exposes both
//! as a small `DecoderConfig`, validated the way `parse_resolution` and
//! `parse_gamma` validate their inputs: reject out-of-range values with
//! `anyhow::Context`/`bail!` rather than silently clamping at construction
//! time (clamping still happens at the call site for `set_volume`, where a
//! bad value is a normal runtime occurrence rather than a misconfiguration).

use anyhow::{bail, Result};

/// Tunables for an [`crate::sound::stream::AdxStream`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Target ceiling on decoded PCM frames buffered between `get_audio`
    /// calls, expressed per channel-frame. The distilled spec's `2048`-
    /// sample figure becomes the default here. The streaming engine only
    /// ever buffers one frame group at a time, so this holds in practice for
    /// any stream whose `chunk_size` keeps a frame group under this figure
    /// (every stream at the default, since `chunk_size <= 255` implies at
    /// most 506 samples per frame group); a stream configured with a smaller
    /// ceiling than its own frame group logs a warning at open time rather
    /// than failing, since a frame group must be decoded as a unit.
    pub staging_capacity_frames: usize,
    /// Upper bound of the host mixer's incoming volume scale.
    pub mixer_volume_max: u8,
    /// Upper bound of the underlying hardware stream's volume scale.
    pub device_volume_max: u8,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            staging_capacity_frames: 2048,
            mixer_volume_max: 128,
            device_volume_max: 255,
        }
    }
}

impl DecoderConfig {
    /// Build a config, rejecting degenerate values that would make
    /// `set_volume`'s scaling factor undefined or the staging buffer
    /// useless.
    pub fn new(
        staging_capacity_frames: usize,
        mixer_volume_max: u8,
        device_volume_max: u8,
    ) -> Result<Self> {
        if staging_capacity_frames == 0 {
            bail!("staging_capacity_frames must be positive");
        }
        if mixer_volume_max == 0 {
            bail!("mixer_volume_max must be positive");
        }
        Ok(Self {
            staging_capacity_frames,
            mixer_volume_max,
            device_volume_max,
        })
    }

    /// Scale a mixer-range volume (clamped to `[0, mixer_volume_max]`) to
    /// the device's range, per §4.8.
    pub fn scale_volume(&self, mixer_volume: u8) -> u8 {
        let clamped = mixer_volume.min(self.mixer_volume_max);
        let scaled =
            clamped as u32 * self.device_volume_max as u32 / self.mixer_volume_max as u32;
        scaled.min(self.device_volume_max as u32) as u8
    }
}
