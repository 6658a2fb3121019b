use tracing::debug;

use super::{Phrase, Pipeline};
use crate::error::Result;

/// Frame length of the stub backend: 300ms at 8kHz, matching the frame size
/// of CTC streaming models this service fronts.
const STUB_FRAME_SIZE: usize = 2400;

/// Stub decoder for development and integration testing.
///
/// Recognizes nothing; its opaque state is a little-endian frame counter so
/// that state threading across calls is still observable end to end.
pub struct StubPipeline {
    frame_size: usize,
}

impl StubPipeline {
    pub fn new() -> Self {
        Self {
            frame_size: STUB_FRAME_SIZE,
        }
    }

    fn frames_seen(state: Option<&[u8]>) -> u64 {
        match state {
            Some(bytes) => {
                let mut buf = [0u8; 8];
                let n = bytes.len().min(8);
                buf[..n].copy_from_slice(&bytes[..n]);
                u64::from_le_bytes(buf)
            }
            None => 0,
        }
    }
}

impl Default for StubPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline for StubPipeline {
    fn name(&self) -> &str {
        "stub"
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn step(
        &self,
        _frame: &[i32],
        state: Option<&[u8]>,
        is_last: bool,
    ) -> Result<(Vec<Phrase>, Vec<u8>)> {
        let seen = Self::frames_seen(state) + 1;
        debug!("Stub pipeline frame {} (is_last={})", seen, is_last);
        Ok((Vec::new(), seen.to_le_bytes().to_vec()))
    }

    fn finalize(&self, state: Option<&[u8]>) -> Result<(Vec<Phrase>, Vec<u8>)> {
        let seen = Self::frames_seen(state);
        debug!("Stub pipeline finalized after {} frames", seen);
        Ok((Vec::new(), seen.to_le_bytes().to_vec()))
    }
}
