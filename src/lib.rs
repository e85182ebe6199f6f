pub mod association;
pub mod bbox;
pub mod capture;
pub mod clock;
pub mod config;
pub mod crossing;
pub mod detection;
pub mod error;
pub mod frame;
pub mod math;
pub mod reaper;
pub mod scene;
pub mod store;
pub mod track;

pub use capture::{CaptureEvent, CropRegion};
pub use config::Config;
pub use detection::Detection;
pub use frame::Frame;
pub use scene::{Diagnostics, FrameReport, Scene};
pub use track::Track;

use clock::TimestampSource;
use error::Error;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

pub trait Tracking {
    /// Feeds one frame of `src`. Returns `None` for skipped frames.
    fn update(&mut self, frame: &Frame, src: &str) -> Result<Option<FrameReport>, Error>;
    fn tracks(&self, src: &str) -> Rc<[Track]>;
}

/// Speed tracker over any number of independent video streams.
pub struct SpeedTracker {
    config: Config,
    clock: Box<dyn TimestampSource>,
    scenes: HashMap<String, Scene>,
}

impl SpeedTracker {
    pub fn new(config: Config) -> Result<Self, Error> {
        let clock = config.timestamps.source();

        Self::with_clock(config, clock)
    }

    /// Uses `clock` instead of the configured timestamp source
    pub fn with_clock(config: Config, clock: Box<dyn TimestampSource>) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            config,
            clock,
            scenes: HashMap::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Detection runs on every `skip_factor`-th frame (1-based numbering)
    #[inline]
    pub fn is_processed(&self, frame_index: u64) -> bool {
        frame_index % self.config.skip_factor as u64 == 0
    }

    #[inline]
    pub fn scene(&self, src: &str) -> Option<&Scene> {
        self.scenes.get(src)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }
}

impl crate::Tracking for SpeedTracker {
    fn update(&mut self, frame: &Frame, src: &str) -> Result<Option<FrameReport>, Error> {
        if !self.is_processed(frame.index) {
            trace!(src, index = frame.index, "frame skipped");
            return Ok(None);
        }

        let timestamp = self.clock.timestamp(frame.index);
        let scale = self.config.processing_scale;

        let detections: Vec<Detection> = frame
            .iter()
            .filter(|d| self.config.accepts(&d.label))
            .map(|d| d.rescaled(scale))
            .collect();

        let filtered = frame.len() - detections.len();

        let scene = if let Some(scene) = self.scenes.get_mut(src) {
            scene
        } else {
            self.scenes
                .entry(src.to_string())
                .or_insert_with(|| Scene::new(&self.config))
        };

        scene.note_filtered(filtered);
        scene.process(timestamp, frame.dims, &detections).map(Some)
    }

    #[inline]
    fn tracks(&self, src: &str) -> Rc<[Track]> {
        if let Some(scene) = self.scenes.get(src) {
            return scene.tracks().into_boxed_slice().into();
        }

        Rc::new([])
    }
}
