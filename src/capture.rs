use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

/// Share of the box height, measured from the bottom, where plates are expected
const PLATE_HEIGHT_RATIO: f32 = 0.25;
/// Horizontal margin on each side, as a share of the box width
const PLATE_MARGIN_RATIO: f32 = 0.1;

/// Pixel rectangle of the original frame, `[x1, x2) x [y1, y2)`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropRegion {
    /// Plate area of a vehicle box, clamped to a `width` x `height` frame.
    pub fn plate(bbox: &BBox<Ltrb>, width: u32, height: u32) -> Self {
        let (x1, y1, x2, y2) = (
            bbox.left().trunc() as i64,
            bbox.top().trunc() as i64,
            bbox.right().trunc() as i64,
            bbox.bottom().trunc() as i64,
        );

        let plate_h = (PLATE_HEIGHT_RATIO * (y2 - y1) as f32) as i64;
        let margin = (PLATE_MARGIN_RATIO * (x2 - x1) as f32) as i64;

        let clamp_x = |v: i64| v.clamp(0, width as i64) as u32;
        let clamp_y = |v: i64| v.clamp(0, height as i64) as u32;

        Self {
            x1: clamp_x(x1 - margin),
            y1: clamp_y(y2 - plate_h),
            x2: clamp_x(x2 + margin),
            y2: clamp_y(y2),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}

/// Request to cut out and store the plate of a freshly measured vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CaptureEvent {
    pub track_id: u32,
    pub label: String,
    pub speed_kmh: f64,
    pub region: CropRegion,
}

impl CaptureEvent {
    /// File name (without extension) for the stored plate image
    pub fn file_stem(&self) -> String {
        format!(
            "vehicle_{}_{}_{:.1}kmh",
            self.track_id, self.label, self.speed_kmh
        )
    }
}
