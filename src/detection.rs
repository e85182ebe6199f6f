use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use nalgebra as na;

/// Contains the detector category and the (x1,y1,x2,y2) corners of the bbox
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    #[serde(rename = "l")]
    pub label: String,
    #[serde(rename = "b")]
    pub bbox: BBox<Ltrb>,
}

impl Detection {
    pub fn new(label: impl Into<String>, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            label: label.into(),
            bbox: BBox::ltrb(x1, y1, x2, y2),
        }
    }

    #[inline(always)]
    pub fn centroid(&self) -> na::Point2<f32> {
        self.bbox.centroid()
    }

    /// Same detection in original frame coordinates
    #[inline]
    pub fn rescaled(&self, scale: f32) -> Self {
        Self {
            label: self.label.clone(),
            bbox: self.bbox.rescale(scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dump_format() {
        let dets: Vec<Detection> =
            serde_json::from_str(r#"[{"l":"car","b":[10.0,20.0,30.0,60.0]}]"#).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "car");
        assert_eq!(dets[0].centroid(), na::Point2::new(20.0, 40.0));
    }
}
