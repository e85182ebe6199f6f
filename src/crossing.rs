//! Line-crossing speed estimation.
//!
//! Every track walks `AwaitingLine1 -> AwaitingLine2 -> SpeedComputed ->
//! PlateCaptured`. Reaching line 2 first, or a non-positive elapsed time,
//! parks the track in a terminal state that never yields a speed.

use serde_derive::{Deserialize, Serialize};

use crate::config::Config;

const MPS_TO_KMH: f64 = 3.6;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SpeedReading {
    pub line1_at: f64,
    pub line2_at: f64,
    pub elapsed: f64,
    pub speed_kmh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossing {
    AwaitingLine1,
    AwaitingLine2 {
        line1_at: f64,
    },
    Line2First {
        line2_at: f64,
        line1_at: Option<f64>,
    },
    Rejected {
        line1_at: f64,
        line2_at: f64,
    },
    SpeedComputed(SpeedReading),
    PlateCaptured(SpeedReading),
}

/// What a single evaluation changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    None,
    Line1,
    Line2First,
    Rejected { elapsed: f64 },
    Speed(SpeedReading),
}

impl Default for Crossing {
    fn default() -> Self {
        Crossing::AwaitingLine1
    }
}

impl Crossing {
    pub fn line1_timestamp(&self) -> Option<f64> {
        match *self {
            Crossing::AwaitingLine1 => None,
            Crossing::AwaitingLine2 { line1_at } | Crossing::Rejected { line1_at, .. } => {
                Some(line1_at)
            }
            Crossing::Line2First { line1_at, .. } => line1_at,
            Crossing::SpeedComputed(r) | Crossing::PlateCaptured(r) => Some(r.line1_at),
        }
    }

    pub fn line2_timestamp(&self) -> Option<f64> {
        match *self {
            Crossing::AwaitingLine1 | Crossing::AwaitingLine2 { .. } => None,
            Crossing::Line2First { line2_at, .. } | Crossing::Rejected { line2_at, .. } => {
                Some(line2_at)
            }
            Crossing::SpeedComputed(r) | Crossing::PlateCaptured(r) => Some(r.line2_at),
        }
    }

    #[inline]
    pub fn reading(&self) -> Option<&SpeedReading> {
        match self {
            Crossing::SpeedComputed(r) | Crossing::PlateCaptured(r) => Some(r),
            _ => None,
        }
    }

    #[inline]
    pub fn speed(&self) -> Option<f64> {
        self.reading().map(|r| r.speed_kmh)
    }

    #[inline]
    pub fn elapsed_time(&self) -> Option<f64> {
        self.reading().map(|r| r.elapsed)
    }

    #[inline]
    pub fn plate_captured(&self) -> bool {
        matches!(self, Crossing::PlateCaptured(_))
    }

    /// Marks the plate of a measured track as captured. Returns false when
    /// there is no speed yet or the plate was captured before.
    pub fn capture(&mut self) -> bool {
        match *self {
            Crossing::SpeedComputed(r) => {
                *self = Crossing::PlateCaptured(r);
                true
            }
            _ => false,
        }
    }
}

/// The two reference rows and the calibration between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedGate {
    pub line1_y: f32,
    pub line2_y: f32,
    pub tolerance: f32,
    pub distance_m: f64,
    pub skip_factor: u32,
}

impl SpeedGate {
    pub fn new(line1_y: f32, line2_y: f32, distance_m: f64, skip_factor: u32) -> Self {
        Self {
            line1_y,
            line2_y,
            tolerance: 10.0,
            distance_m,
            skip_factor,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            tolerance: cfg.crossing_tolerance,
            ..Self::new(cfg.line1_y, cfg.line2_y, cfg.real_distance_m, cfg.skip_factor)
        }
    }

    /// Distance used for the speed estimate.
    ///
    /// With frame skipping the configured distance is divided by the skip
    /// factor. This mirrors the calibration of the deployed system and is
    /// not derived from the geometry.
    #[inline]
    pub fn adjusted_distance(&self) -> f64 {
        if self.skip_factor > 1 {
            self.distance_m / self.skip_factor as f64
        } else {
            self.distance_m
        }
    }

    #[inline]
    fn near(&self, cy: f32, line_y: f32) -> bool {
        (cy - line_y).abs() < self.tolerance
    }

    pub fn speed_kmh(&self, elapsed: f64) -> f64 {
        (self.adjusted_distance() / elapsed) * MPS_TO_KMH
    }

    /// Advances `state` for a track whose centroid row is now `cy`.
    pub fn evaluate(&self, state: &mut Crossing, cy: f32, now: f64) -> Transition {
        let line1_unset = state.line1_timestamp().is_none();
        let line2_unset = state.line2_timestamp().is_none();

        if line1_unset && self.near(cy, self.line1_y) {
            *state = match *state {
                Crossing::Line2First { line2_at, .. } => Crossing::Line2First {
                    line2_at,
                    line1_at: Some(now),
                },
                _ => Crossing::AwaitingLine2 { line1_at: now },
            };

            return Transition::Line1;
        }

        if line2_unset && self.near(cy, self.line2_y) {
            let line1_at = match *state {
                Crossing::AwaitingLine2 { line1_at } => line1_at,
                _ => {
                    *state = Crossing::Line2First {
                        line2_at: now,
                        line1_at: None,
                    };

                    return Transition::Line2First;
                }
            };

            let elapsed = now - line1_at;
            if elapsed > 0.0 {
                let reading = SpeedReading {
                    line1_at,
                    line2_at: now,
                    elapsed,
                    speed_kmh: self.speed_kmh(elapsed),
                };

                *state = Crossing::SpeedComputed(reading);

                return Transition::Speed(reading);
            }

            *state = Crossing::Rejected {
                line1_at,
                line2_at: now,
            };

            return Transition::Rejected { elapsed };
        }

        Transition::None
    }
}
