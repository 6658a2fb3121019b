//! Frame segmentation for the decoder pipeline.

/// A fixed-length frame of samples ready for one decoder step.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Exactly `frame_size` samples, zero-padded on the right when the
    /// source buffer ran short.
    pub samples: Vec<i32>,
    /// True only on the final frame of a multi-frame batch. Marks
    /// end-of-this-batch for the decoder's internal state machine, never
    /// end-of-stream; end-of-stream is signaled by finalize.
    pub is_last: bool,
}

/// Split a sample buffer into consecutive non-overlapping frames of
/// `frame_size` samples.
///
/// - buffer shorter than one frame: one right-zero-padded frame, `is_last = false`
/// - buffer of exactly one frame: one unpadded frame, `is_last = false`
/// - longer buffers: zero-padded to a multiple of `frame_size` and split in
///   order, with `is_last = true` only on the final frame
///
/// Pure function. Panics if `frame_size` is zero (programming error).
pub fn segment(samples: &[i32], frame_size: usize) -> Vec<Frame> {
    assert!(frame_size > 0, "frame_size must be positive");

    if samples.len() <= frame_size {
        let mut frame = samples.to_vec();
        frame.resize(frame_size, 0);
        return vec![Frame {
            samples: frame,
            is_last: false,
        }];
    }

    let mut padded = samples.to_vec();
    let remainder = padded.len() % frame_size;
    if remainder != 0 {
        padded.resize(padded.len() + frame_size - remainder, 0);
    }

    let num_frames = padded.len() / frame_size;
    padded
        .chunks_exact(frame_size)
        .enumerate()
        .map(|(i, chunk)| Frame {
            samples: chunk.to_vec(),
            is_last: i == num_frames - 1,
        })
        .collect()
}
