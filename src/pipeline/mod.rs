//! Decoder pipeline boundary
//!
//! The acoustic decoder is an external collaborator behind the [`Pipeline`]
//! trait. It consumes fixed-size audio frames plus an opaque state blob and
//! returns recognized phrases plus a new state. The rest of the service never
//! interprets the state contents.

mod stub;

pub use stub::StubPipeline;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A recognized phrase with timestamps, immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub text: String,
    /// Start of the phrase in seconds
    pub start_time: f64,
    /// End of the phrase in seconds
    pub end_time: f64,
}

impl Phrase {
    /// Identity used for end-of-session deduplication: exact
    /// (start_time, end_time) bit pattern match.
    pub fn timing_key(&self) -> (u64, u64) {
        (self.start_time.to_bits(), self.end_time.to_bits())
    }
}

/// Streaming speech decoder.
///
/// Implementations must be safe to share across concurrent requests; one
/// instance is created at startup and lives for the whole process. Inference
/// calls are synchronous and potentially CPU-bound, so callers run them on a
/// blocking thread.
pub trait Pipeline: Send + Sync {
    /// Backend name for logging and health reporting
    fn name(&self) -> &str;

    /// Required frame length in samples; the segmenter pads/splits incoming
    /// audio to this size. Always positive.
    fn frame_size(&self) -> usize;

    /// Decode one frame, carrying the opaque state forward.
    ///
    /// `state` is `None` for the first frame of a session. `is_last` marks the
    /// final frame of the current batch, not the end of the stream.
    fn step(
        &self,
        frame: &[i32],
        state: Option<&[u8]>,
        is_last: bool,
    ) -> Result<(Vec<Phrase>, Vec<u8>)>;

    /// Flush the decoder and return trailing phrases. The returned state is
    /// not meaningful afterwards.
    fn finalize(&self, state: Option<&[u8]>) -> Result<(Vec<Phrase>, Vec<u8>)>;
}
