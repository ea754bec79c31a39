// Audio playback module
// Uses Symphonia for decoding and cpal for output

pub mod decoder;
#[cfg(feature = "native-output")]
pub mod engine;
#[cfg(feature = "native-output")]
pub mod output;
#[cfg(feature = "native-output")]
pub mod resample;

#[cfg(feature = "native-output")]
pub use engine::NativeMediaElement;
