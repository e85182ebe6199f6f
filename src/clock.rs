use serde_derive::{Deserialize, Serialize};
use std::time::Instant;

/// Supplies the timestamp (in seconds) of a processed frame.
pub trait TimestampSource {
    fn timestamp(&mut self, frame_index: u64) -> f64;
}

/// Host time at the processing instant, measured from construction.
///
/// Speeds are only meaningful when frames are processed in real time.
#[derive(Debug, Clone)]
pub struct WallClock {
    started: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampSource for WallClock {
    #[inline]
    fn timestamp(&mut self, _frame_index: u64) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Timestamps derived from the frame position and the nominal stream rate.
#[derive(Debug, Clone, Copy)]
pub struct FrameRate {
    pub fps: f64,
}

impl FrameRate {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }
}

impl TimestampSource for FrameRate {
    #[inline]
    fn timestamp(&mut self, frame_index: u64) -> f64 {
        frame_index as f64 / self.fps
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Timestamps {
    WallClock,
    FrameRate { fps: f64 },
}

impl Default for Timestamps {
    fn default() -> Self {
        Timestamps::WallClock
    }
}

impl Timestamps {
    pub fn source(&self) -> Box<dyn TimestampSource> {
        match *self {
            Timestamps::WallClock => Box::new(WallClock::new()),
            Timestamps::FrameRate { fps } => Box::new(FrameRate::new(fps)),
        }
    }
}
