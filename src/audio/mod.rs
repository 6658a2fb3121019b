//! Audio handling: decoding uploaded files and reshaping sample buffers
//! into the fixed-size frames the decoder pipeline requires.

pub mod decode;
pub mod segment;

pub use decode::{decode_audio, TARGET_SAMPLE_RATE};
pub use segment::{segment, Frame};
