use crate::bbox::{BBox, Ltrb};
use crate::crossing::Crossing;
use crate::detection::Detection;
use nalgebra as na;

/// Tracked vehicle as stored by the scene
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: u32,
    pub centroid: na::Point2<f32>,
    pub bbox: BBox<Ltrb>,
    pub label: String,
    pub matched_this_frame: bool,
    pub frames_absent: u32,
    pub active: bool,
    /// Processed frame that last matched this track
    pub last_seen: u64,
    pub crossing: Crossing,
}

impl Participant {
    pub fn new(id: u32, frame: u64, det: &Detection) -> Self {
        Self {
            id,
            centroid: det.centroid(),
            bbox: det.bbox,
            label: det.label.clone(),
            matched_this_frame: true,
            frames_absent: 0,
            active: true,
            last_seen: frame,
            crossing: Crossing::AwaitingLine1,
        }
    }

    pub fn update(&mut self, frame: u64, det: &Detection) {
        self.centroid = det.centroid();
        self.bbox = det.bbox;
        if self.label != det.label {
            self.label.clone_from(&det.label);
        }

        self.matched_this_frame = true;
        self.frames_absent = 0;
        self.active = true;
        self.last_seen = frame;
    }

    #[inline]
    pub fn speed(&self) -> Option<f64> {
        self.crossing.speed()
    }

    /// Frozen: retained for display but no longer updated
    #[inline]
    pub fn is_frozen(&self) -> bool {
        !self.active
    }
}

/// Read-only view of a track for renderers and callers
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: u32,
    pub bbox: BBox<Ltrb>,
    pub label: String,
    pub active: bool,
    pub frames_absent: u32,

    // km/h
    pub speed: Option<f64>,

    // seconds between the two line crossings
    pub elapsed_time: Option<f64>,

    pub line1_timestamp: Option<f64>,
    pub line2_timestamp: Option<f64>,
    pub plate_captured: bool,
}

impl From<&Participant> for Track {
    fn from(p: &Participant) -> Track {
        Track {
            track_id: p.id,
            bbox: p.bbox,
            label: p.label.clone(),
            active: p.active,
            frames_absent: p.frames_absent,
            speed: p.crossing.speed(),
            elapsed_time: p.crossing.elapsed_time(),
            line1_timestamp: p.crossing.line1_timestamp(),
            line2_timestamp: p.crossing.line2_timestamp(),
            plate_captured: p.crossing.plate_captured(),
        }
    }
}
