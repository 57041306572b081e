//! Streaming decoder for CRI ADX ADPCM audio.
//!
//! Parses the ADX container header, decodes its 2-tap IIR ADPCM frames, and
//! exposes the result through [`sound::interface::MusicInterface`], a
//! pluggable "music source" vtable meant to sit alongside other decoders in
//! a host audio mixer the way the reference codebase's `SoundDecoder`
//! implementations (Ogg Vorbis, WAV, DukAud, ...) do.

pub mod config;
pub mod sound;

pub use config::DecoderConfig;
pub use sound::byte_source::ByteSource;
pub use sound::error::{AdxError, AdxResult};
pub use sound::header::AdxHeader;
pub use sound::interface::{AdxHandle, MusicInterface, MUSIC_INTERFACE};
pub use sound::stream::AdxStream;
