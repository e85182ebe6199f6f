use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::association::Strategy;
use crate::clock::Timestamps;
use crate::error::Error;

pub const DEFAULT_LABELS: [&str; 5] = ["car", "truck", "bus", "motorcycle", "van"];

/// Run configuration, fixed for the whole stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Row of the first reference line (crossed first)
    pub line1_y: f32,
    /// Row of the second reference line
    pub line2_y: f32,
    /// Real-world distance between the lines, in meters
    pub real_distance_m: f64,
    /// Only every Nth frame is processed
    pub skip_factor: u32,
    /// Processing resolution relative to the original frame
    pub processing_scale: f32,
    /// Processed frames a track may go unmatched before it is reaped
    pub absence_tolerance: u32,
    /// Lower bound of the association gate, in pixels
    pub match_threshold_floor: f32,
    /// Max centroid distance to a line row that counts as a crossing
    pub crossing_tolerance: f32,
    /// Detector categories to track; empty accepts everything
    pub labels: Vec<String>,
    pub association: Strategy,
    pub timestamps: Timestamps,
    /// Max number of frozen tracks with a speed kept around; `None` keeps all
    pub retention_cap: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            line1_y: 150.0,
            line2_y: 700.0,
            real_distance_m: 75.0,
            skip_factor: 1,
            processing_scale: 1.0,
            absence_tolerance: 30,
            match_threshold_floor: 50.0,
            crossing_tolerance: 10.0,
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
            association: Strategy::default(),
            timestamps: Timestamps::default(),
            retention_cap: Some(1024),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.line1_y < self.line2_y) {
            return Err(Error::InvalidConfig(format!(
                "line1_y ({}) must be above line2_y ({})",
                self.line1_y, self.line2_y
            )));
        }

        if !(self.real_distance_m > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "real_distance_m must be positive, got {}",
                self.real_distance_m
            )));
        }

        if self.skip_factor == 0 {
            return Err(Error::InvalidConfig("skip_factor must be at least 1".into()));
        }

        if !(self.processing_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "processing_scale must be positive, got {}",
                self.processing_scale
            )));
        }

        if let Timestamps::FrameRate { fps } = self.timestamps {
            if !(fps > 0.0) {
                return Err(Error::InvalidConfig(format!("fps must be positive, got {}", fps)));
            }
        }

        if self.retention_cap == Some(0) {
            return Err(Error::InvalidConfig("retention_cap must be at least 1".into()));
        }

        Ok(())
    }

    #[inline]
    pub fn accepts(&self, label: &str) -> bool {
        self.labels.is_empty() || self.labels.iter().any(|l| l == label)
    }
}
