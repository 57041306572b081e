//! Music-interface binding exposed to the host mixer.
//!
//! The reference codebase registers a `TFB_SoundDecoderFuncs`, a `#[repr(C)]`
//! vtable of `extern "C"` function pointers, once per decoder backend. This
//! crate's host is assumed to be a Rust mixer rather than a C one, so
//! `MusicInterface` keeps the same "named-operation vtable of fn pointers,
//! registered once at module scope" shape but drops the `extern "C"`/`repr(C)`
//! layer; an embedder that genuinely needs raw C interop can wrap this in its
//! own `#[repr(C)]` shim outside this crate.
//!
//! `create_from_source` degrades `Result<AdxStream, AdxError>` to
//! `Option<Box<AdxHandle>>` plus a thread-local last-error slot, mirroring
//! `SoundDecoder::get_error`'s "fetch the error after a null return" pattern
//! from the reference codebase.

use std::cell::RefCell;

use super::byte_source::ByteSource;
use super::error::AdxError;
use super::stream::AdxStream;
use crate::config::DecoderConfig;

/// A boxed, type-erased byte source is itself a valid [`ByteSource`]; this
/// lets [`AdxHandle`] be a concrete, non-generic type suitable for a vtable.
impl ByteSource for Box<dyn ByteSource> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        (**self).read(buf)
    }

    fn seek_absolute(&mut self, offset: u64) -> std::io::Result<u64> {
        (**self).seek_absolute(offset)
    }

    fn tell(&mut self) -> std::io::Result<u64> {
        (**self).tell()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Opaque instance handle passed across the [`MusicInterface`] vtable.
pub type AdxHandle = AdxStream<Box<dyn ByteSource>>;

thread_local! {
    static LAST_ERROR: RefCell<Option<AdxError>> = const { RefCell::new(None) };
}

/// Retrieve and clear the error set by the most recent failed
/// `create_from_source` call on this thread.
pub fn take_last_error() -> Option<AdxError> {
    LAST_ERROR.with(|cell| cell.borrow_mut().take())
}

fn set_last_error(err: AdxError) {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = Some(err));
}

fn create_from_source(src: Box<dyn ByteSource>, owns_source: bool) -> Option<Box<AdxHandle>> {
    match AdxStream::create_from_source(src, owns_source) {
        Ok(stream) => Some(Box::new(stream)),
        Err(e) => {
            set_last_error(e);
            None
        }
    }
}

fn play(handle: &mut AdxHandle, play_count: i32) {
    handle.play(play_count);
}

fn get_audio(handle: &mut AdxHandle, dst: &mut [u8]) -> usize {
    handle.get_audio(dst)
}

fn seek(handle: &mut AdxHandle, position_seconds: f64) -> f64 {
    match handle.seek(position_seconds) {
        Ok(()) => position_seconds,
        Err(e) => {
            set_last_error(e);
            -1.0
        }
    }
}

fn tell(handle: &mut AdxHandle) -> f64 {
    handle.tell()
}

fn duration(handle: &AdxHandle) -> f64 {
    handle.duration()
}

fn pause(handle: &mut AdxHandle) {
    handle.pause();
}

fn resume(handle: &mut AdxHandle) {
    handle.resume();
}

fn stop(handle: &mut AdxHandle) {
    handle.stop();
}

fn is_playing(handle: &AdxHandle) -> bool {
    handle.is_playing()
}

/// §4.8: linear-scale a mixer volume (0..=`mixer_volume_max`) to the
/// device's range. Volume is entirely a host-side concern in this crate, so
/// this is a pure scaling function the host applies to its own hardware
/// stream; the decoder instance itself never touches playback level.
fn set_volume(config: &DecoderConfig, mixer_volume: u8) -> u8 {
    config.scale_volume(mixer_volume)
}

fn delete(_handle: Box<AdxHandle>) {
    // `AdxHandle`'s `Drop` closes the source iff it owns it; nothing else
    // to do here. The slot exists because the vtable names every reference
    // codebase operation explicitly, including the ones that reduce to a
    // plain `drop`.
}

/// A vtable of plain (non-`extern "C"`) function pointers implementing the
/// music-interface contract over a boxed [`AdxHandle`].
pub struct MusicInterface {
    pub create_from_source: fn(Box<dyn ByteSource>, bool) -> Option<Box<AdxHandle>>,
    pub play: fn(&mut AdxHandle, i32),
    pub get_audio: fn(&mut AdxHandle, &mut [u8]) -> usize,
    pub seek: fn(&mut AdxHandle, f64) -> f64,
    pub tell: fn(&mut AdxHandle) -> f64,
    pub duration: fn(&AdxHandle) -> f64,
    pub pause: fn(&mut AdxHandle),
    pub resume: fn(&mut AdxHandle),
    pub stop: fn(&mut AdxHandle),
    pub is_playing: fn(&AdxHandle) -> bool,
    pub set_volume: fn(&DecoderConfig, u8) -> u8,
    pub delete: fn(Box<AdxHandle>),
}

/// The single, stateless music-interface record the host registers at
/// startup, per §9's "model this as a constant vtable value exported at
/// module scope with no mutable state."
pub static MUSIC_INTERFACE: MusicInterface = MusicInterface {
    create_from_source,
    play,
    get_audio,
    seek,
    tell,
    duration,
    pause,
    resume,
    stop,
    is_playing,
    set_volume,
    delete,
};
