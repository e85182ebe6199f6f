use tracing::{debug, info, warn};

use crate::association::{Association, Target};
use crate::capture::{CaptureEvent, CropRegion};
use crate::config::Config;
use crate::crossing::{SpeedGate, Transition};
use crate::detection::Detection;
use crate::error::Error;
use crate::reaper::{self, Reaped};
use crate::store::TrackStore;
use crate::Track;

/// Cumulative counters of one stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub processed_frames: u64,
    pub filtered_detections: u64,
    pub spawned: u64,
    pub removed: u64,
    pub frozen: u64,
    pub evicted: u64,
    pub speeds: u64,
    pub line2_first: u64,
    pub rejected_elapsed: u64,
    pub degenerate_crops: u64,
    pub captures: u64,
}

/// Outcome of one processed frame
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameReport {
    /// Processed-frame counter of the scene (1-based)
    pub frame: u64,
    pub timestamp: f64,
    pub events: Vec<CaptureEvent>,
    pub matched: usize,
    pub spawned: usize,
    pub reaped: Reaped,
    pub evicted: Vec<u32>,
}

/// Tracking state of a single video stream.
pub struct Scene {
    store: TrackStore,
    gate: SpeedGate,
    associator: Box<dyn Association>,
    match_threshold_floor: f32,
    absence_tolerance: u32,
    last_timestamp: f64,
    diagnostics: Diagnostics,
}

impl Scene {
    pub fn new(cfg: &Config) -> Self {
        Self {
            store: TrackStore::new(cfg.retention_cap),
            gate: SpeedGate::from_config(cfg),
            associator: cfg.association.associator(),
            match_threshold_floor: cfg.match_threshold_floor,
            absence_tolerance: cfg.absence_tolerance,
            last_timestamp: f64::NEG_INFINITY,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Runs association, crossing evaluation, capture and reaping for one
    /// processed frame. `detections` are in original frame coordinates and
    /// `dims` is the original frame size.
    pub fn process(
        &mut self,
        timestamp: f64,
        dims: (u32, u32),
        detections: &[Detection],
    ) -> Result<FrameReport, Error> {
        if !timestamp.is_finite() {
            return Err(Error::NonFiniteTimestamp(timestamp));
        }

        if timestamp < self.last_timestamp {
            return Err(Error::NonMonotonicTimestamp {
                previous: self.last_timestamp,
                current: timestamp,
            });
        }

        self.last_timestamp = timestamp;
        self.diagnostics.processed_frames += 1;

        let frame = self.diagnostics.processed_frames;
        let mut report = FrameReport {
            frame,
            timestamp,
            ..Default::default()
        };

        for t in self.store.iter_mut() {
            t.matched_this_frame = false;
        }

        let targets = self
            .associator
            .associate(&self.store, detections, self.match_threshold_floor);

        let mut spawned: Vec<u32> = Vec::new();

        for (det, target) in detections.iter().zip(targets) {
            let id = match target {
                Target::Track(id) => id,
                Target::Spawn(n) => match spawned.get(n) {
                    Some(&id) => id,
                    None => {
                        let id = self.store.spawn(frame, det);
                        debug!(id, label = %det.label, "new track");
                        spawned.push(id);
                        continue;
                    }
                },
            };

            report.matched += 1;

            if let Some(event) = self.apply(id, frame, timestamp, dims, det) {
                report.events.push(event);
            }
        }

        report.spawned = spawned.len();
        report.reaped = reaper::sweep(&mut self.store, self.absence_tolerance);
        report.evicted = self.store.retain_capacity();

        for id in &report.evicted {
            debug!(id, "frozen track evicted");
        }

        self.diagnostics.spawned += report.spawned as u64;
        self.diagnostics.removed += report.reaped.removed as u64;
        self.diagnostics.frozen += report.reaped.frozen as u64;
        self.diagnostics.evicted += report.evicted.len() as u64;

        Ok(report)
    }

    /// Moves a track onto `det`, then runs the crossing state machine and
    /// the capture trigger for it.
    fn apply(
        &mut self,
        id: u32,
        frame: u64,
        timestamp: f64,
        dims: (u32, u32),
        det: &Detection,
    ) -> Option<CaptureEvent> {
        let t = self.store.get_mut(id)?;
        t.update(frame, det);

        match self.gate.evaluate(&mut t.crossing, t.centroid.y, timestamp) {
            Transition::None => None,
            Transition::Line1 => {
                debug!(id, label = %t.label, timestamp, "line 1 crossed");
                None
            }
            Transition::Line2First => {
                self.diagnostics.line2_first += 1;
                debug!(id, label = %t.label, timestamp, "line 2 crossed before line 1");
                None
            }
            Transition::Rejected { elapsed } => {
                self.diagnostics.rejected_elapsed += 1;
                warn!(id, elapsed, "non-positive time between line crossings");
                None
            }
            Transition::Speed(reading) => {
                self.diagnostics.speeds += 1;
                info!(
                    id,
                    label = %t.label,
                    speed_kmh = reading.speed_kmh,
                    elapsed = reading.elapsed,
                    "speed measured"
                );

                let region = CropRegion::plate(&t.bbox, dims.0, dims.1);
                if region.is_empty() {
                    self.diagnostics.degenerate_crops += 1;
                    warn!(id, ?region, "plate region is empty, no capture");
                    return None;
                }

                if !t.crossing.capture() {
                    return None;
                }

                self.diagnostics.captures += 1;
                debug!(id, ?region, "plate capture requested");

                Some(CaptureEvent {
                    track_id: id,
                    label: t.label.clone(),
                    speed_kmh: reading.speed_kmh,
                    region,
                })
            }
        }
    }

    #[inline]
    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn note_filtered(&mut self, count: usize) {
        self.diagnostics.filtered_detections += count as u64;
    }

    pub fn active_count(&self) -> usize {
        self.store.iter().filter(|t| t.active).count()
    }

    /// Snapshot of all tracks, frozen ones included
    pub fn tracks(&self) -> Vec<Track> {
        self.store.iter().map(Into::into).collect()
    }

    pub fn active_tracks(&self) -> Vec<Track> {
        self.store
            .iter()
            .filter(|t| t.active)
            .map(Into::into)
            .collect()
    }
}
