use crate::bbox::{BBox, Ltrb};
use nalgebra as na;

/// Share of the smaller box side a centroid may drift between two processed frames
pub const DRIFT_RATIO: f32 = 0.4;

#[inline]
pub fn distance(a: &na::Point2<f32>, b: &na::Point2<f32>) -> f32 {
    na::distance(a, b)
}

/// Association gate for a detection box.
///
/// Small (far away) boxes fall back to `floor`, large (near) boxes tolerate
/// proportionally more drift.
#[inline]
pub fn match_threshold(bbox: &BBox<Ltrb>, floor: f32) -> f32 {
    floor.max(bbox.min_side() * DRIFT_RATIO)
}

#[inline]
pub fn within(a: &na::Point2<f32>, b: &na::Point2<f32>, threshold: f32) -> bool {
    distance(a, b) < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_has_floor() {
        let small = BBox::ltrb(0.0, 0.0, 100.0, 100.0);

        assert_eq!(match_threshold(&small, 50.0), 50.0);
    }

    #[test]
    fn threshold_grows_with_smaller_side() {
        let mut prev = 0.0;

        for side in [10.0, 100.0, 125.0, 200.0, 400.0, 1000.0] {
            let bbox = BBox::ltrb(500.0 - side / 2.0, 0.0, 500.0 + side / 2.0, 2000.0);
            let t = match_threshold(&bbox, 50.0);

            assert!(t >= prev, "threshold shrank at side {}", side);
            prev = t;
        }

        let large = BBox::ltrb(0.0, 0.0, 400.0, 300.0);
        assert!((match_threshold(&large, 50.0) - 120.0).abs() < 1e-4);
    }

    #[test]
    fn euclidean_distance() {
        let a = na::Point2::new(0.0, 0.0);
        let b = na::Point2::new(36.0, 48.0);

        assert_eq!(distance(&a, &b), 60.0);
        assert!(!within(&a, &b, 60.0));
        assert!(within(&a, &b, 60.5));
    }
}
