use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

use nalgebra as na;

pub trait BBoxFormat: std::fmt::Debug + Copy {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// Serialized as the bare `[f32; 4]` coordinates
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);

impl<F: BBoxFormat> From<BBox<F>> for [f32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> From<[f32; 4]> for BBox<F> {
    fn from(slice: [f32; 4]) -> Self {
        BBox(slice, Default::default())
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.0
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        BBox([x1, y1, x2, y2], Default::default())
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    /// Horizontal extent, zero for inverted boxes
    #[inline]
    pub fn width(&self) -> f32 {
        (self.right() - self.left()).max(0.0)
    }

    /// Vertical extent, zero for inverted boxes
    #[inline]
    pub fn height(&self) -> f32 {
        (self.bottom() - self.top()).max(0.0)
    }

    #[inline]
    pub fn min_side(&self) -> f32 {
        self.width().min(self.height())
    }

    #[inline]
    pub fn centroid(&self) -> na::Point2<f32> {
        na::Point2::new(
            (self.left() + self.right()) * 0.5,
            (self.top() + self.bottom()) * 0.5,
        )
    }

    /// Maps a box found on a downscaled frame back onto the original frame.
    ///
    /// Coordinates are divided by `scale` and truncated to whole pixels,
    /// unit scale included.
    pub fn rescale(&self, scale: f32) -> Self {
        let [x1, y1, x2, y2] = self.0;

        Self::ltrb(
            (x1 / scale).trunc(),
            (y1 / scale).trunc(),
            (x2 / scale).trunc(),
            (y2 / scale).trunc(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_is_box_midpoint() {
        let b = BBox::ltrb(100.0, 200.0, 300.0, 260.0);
        let c = b.centroid();

        assert_eq!(c, na::Point2::new(200.0, 230.0));
        assert_eq!(b.min_side(), 60.0);
    }

    #[test]
    fn inverted_box_has_no_size() {
        let b = BBox::ltrb(300.0, 200.0, 100.0, 100.0);

        assert_eq!(b.width(), 0.0);
        assert_eq!(b.height(), 0.0);
        assert_eq!(b.min_side(), 0.0);
    }

    #[test]
    fn rescale_maps_to_original_pixels() {
        let b = BBox::ltrb(10.3, 20.0, 50.9, 75.5).rescale(0.5);

        assert_eq!(b.as_slice(), &[20.0, 40.0, 101.0, 151.0]);
    }

    #[test]
    fn unit_scale_still_truncates() {
        let b = BBox::ltrb(10.3, 20.0, 50.9, 75.5).rescale(1.0);

        assert_eq!(b.as_slice(), &[10.0, 20.0, 50.0, 75.0]);
    }

    #[test]
    fn serializes_as_bare_coordinates() {
        let b = BBox::ltrb(1.0, 2.0, 3.5, 4.0);
        let json = serde_json::to_string(&b).unwrap();

        assert_eq!(json, "[1.0,2.0,3.5,4.0]");
        assert_eq!(serde_json::from_str::<BBox<Ltrb>>(&json).unwrap(), b);
    }
}
