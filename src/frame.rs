//! Frame representation and the `FrameSource` collaborator interface
//! (`spec.md` §3, §6).
//!
//! `Frame` itself is the only thing the clustering core owns; everything
//! that produces frames (FITS cubes, ASCII matrices, MP4 decode, shared
//! memory rings) lives outside this crate's scope and is represented here
//! only as the `FrameSource` trait boundary.

use std::time::Duration;

/// Stable, monotonically assigned frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u64);

/// One unit of input: a dense real-valued buffer of fixed shape.
///
/// Shape is `(width, height)`; a flat feature vector of length `D` is
/// represented as `(D, 1)`. Immutable once read, per `spec.md` §3.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: FrameId,
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl Frame {
    pub fn new(id: FrameId, width: usize, height: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            id,
            width,
            height,
            data,
        }
    }

    /// Convenience constructor for flat feature vectors.
    pub fn vector(id: FrameId, data: Vec<f64>) -> Self {
        let len = data.len();
        Self::new(id, len, 1, data)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

/// External collaborator yielding frames from whatever backing store the
/// host chooses (`spec.md` §6). The engine only ever calls these four
/// operations; everything about how frames are produced is out of scope.
pub trait FrameSource {
    /// `(width, height, frame_count)`; `frame_count` is `None` when unknown
    /// ahead of time, in which case `next()` returning `None` terminates
    /// the stream.
    fn open(&mut self) -> (usize, usize, Option<u64>);
    fn next(&mut self) -> Option<Frame>;
    fn get_at(&mut self, index: u64) -> Option<Frame>;
    fn reset(&mut self);
}

/// In-memory source over a fixed `Vec<Frame>`, used by tests and by the
/// deterministic scenarios in `tests/scenarios.rs`.
pub struct VecFrameSource {
    frames: Vec<Frame>,
    cursor: usize,
}

impl VecFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames, cursor: 0 }
    }
}

impl FrameSource for VecFrameSource {
    fn open(&mut self) -> (usize, usize, Option<u64>) {
        let (w, h) = self.frames.first().map(Frame::shape).unwrap_or((0, 0));
        (w, h, Some(self.frames.len() as u64))
    }

    fn next(&mut self) -> Option<Frame> {
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        frame
    }

    fn get_at(&mut self, index: u64) -> Option<Frame> {
        self.frames.get(index as usize).cloned()
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// A `FrameSource` modeling the shared-memory ring described in
/// `spec.md` §5: `next()` blocks on a channel with a bounded timeout and
/// returns `None` on timeout or overrun, rather than erroring, so the
/// engine's run loop can terminate gracefully.
pub struct ChannelFrameSource {
    rx: crossbeam_channel::Receiver<Frame>,
    width: usize,
    height: usize,
    wait: Duration,
    all: Vec<Frame>,
}

impl ChannelFrameSource {
    pub fn new(rx: crossbeam_channel::Receiver<Frame>, width: usize, height: usize) -> Self {
        Self {
            rx,
            width,
            height,
            wait: Duration::from_secs(1),
            all: Vec::new(),
        }
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }
}

impl FrameSource for ChannelFrameSource {
    fn open(&mut self) -> (usize, usize, Option<u64>) {
        (self.width, self.height, None)
    }

    fn next(&mut self) -> Option<Frame> {
        match self.rx.recv_timeout(self.wait) {
            Ok(frame) => {
                self.all.push(frame.clone());
                Some(frame)
            }
            Err(_) => None,
        }
    }

    fn get_at(&mut self, index: u64) -> Option<Frame> {
        self.all.get(index as usize).cloned()
    }

    fn reset(&mut self) {
        // A live ring cannot rewind; replay is served from what has been
        // observed so far, matching "reset to index 0" semantics for the
        // already-buffered prefix only.
    }
}
