//! Detection-to-track association strategies.
//!
//! `GreedyFirstFit` reproduces the matching of the deployed system: each
//! detection takes the first track (in id order) whose centroid lies inside
//! the detection gate. Tracks created or matched earlier in the same frame
//! stay candidates, so in dense traffic two detections can land on one id.
//! `Hungarian` solves a minimum-distance assignment under the same gate and
//! gives every track at most one detection.

use serde_derive::{Deserialize, Serialize};
use tracing::warn;

use crate::detection::Detection;
use crate::math;
use crate::store::TrackStore;
use munkres::{solve_assignment, WeightMatrix};
use nalgebra as na;

const MAX_MATRIX_SIZE: usize = 256;
const GATED_OUT: f32 = 100000.0;

/// Where a detection goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Existing track id
    Track(u32),
    /// The n-th track spawned in this frame (0-based, in detection order)
    Spawn(usize),
}

pub trait Association {
    /// Returns one target per detection, in detection order.
    fn associate(&self, store: &TrackStore, detections: &[Detection], floor: f32) -> Vec<Target>;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Greedy,
    Hungarian,
}

impl Strategy {
    pub fn associator(&self) -> Box<dyn Association> {
        match self {
            Strategy::Greedy => Box::new(GreedyFirstFit),
            Strategy::Hungarian => Box::new(Hungarian),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyFirstFit;

impl Association for GreedyFirstFit {
    fn associate(&self, store: &TrackStore, detections: &[Detection], floor: f32) -> Vec<Target> {
        // Candidates move as detections are applied, the scene does the same
        let mut candidates: Vec<(Target, na::Point2<f32>)> = store
            .iter()
            .map(|t| (Target::Track(t.id), t.centroid))
            .collect();

        let mut spawned = 0;
        let mut targets = Vec::with_capacity(detections.len());

        for det in detections {
            let pos = det.centroid();
            let threshold = math::match_threshold(&det.bbox, floor);

            let found = candidates
                .iter_mut()
                .find(|(_, c)| math::within(c, &pos, threshold));

            let target = match found {
                Some((target, centroid)) => {
                    *centroid = pos;
                    *target
                }
                None => {
                    let target = Target::Spawn(spawned);
                    spawned += 1;
                    candidates.push((target, pos));
                    target
                }
            };

            targets.push(target);
        }

        targets
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Hungarian;

impl Association for Hungarian {
    fn associate(&self, store: &TrackStore, detections: &[Detection], floor: f32) -> Vec<Target> {
        let dets: Vec<(na::Point2<f32>, f32)> = detections
            .iter()
            .map(|d| (d.centroid(), math::match_threshold(&d.bbox, floor)))
            .collect();

        // Only tracks some detection can reach take part in the assignment,
        // so retained frozen tracks do not grow the matrix
        let tracks: Vec<(u32, na::Point2<f32>)> = store
            .iter()
            .filter(|t| dets.iter().any(|(pos, th)| math::within(&t.centroid, pos, *th)))
            .map(|t| (t.id, t.centroid))
            .collect();

        let mut assigned: Vec<Option<u32>> = vec![None; detections.len()];

        if !tracks.is_empty() && !dets.is_empty() {
            let n = tracks.len().max(dets.len());

            if n > MAX_MATRIX_SIZE {
                warn!(size = n, "cost matrix too big, falling back to greedy matching");
                return GreedyFirstFit.associate(store, detections, floor);
            }

            let cost = |r: usize, c: usize| -> f32 {
                if r < tracks.len() && c < dets.len() {
                    let (pos, threshold) = dets[c];
                    let d = math::distance(&tracks[r].1, &pos);
                    if d < threshold {
                        return d;
                    }
                }

                GATED_OUT
            };

            let mut mat = WeightMatrix::from_fn(n, |(r, c)| cost(r, c));

            match solve_assignment(&mut mat) {
                Ok(solution) => {
                    for pos in solution {
                        if cost(pos.row, pos.column) < GATED_OUT {
                            assigned[pos.column] = Some(tracks[pos.row].0);
                        }
                    }
                }
                Err(err) => {
                    warn!(?err, "assignment could not be solved, falling back to greedy matching");
                    return GreedyFirstFit.associate(store, detections, floor);
                }
            }
        }

        let mut spawned = 0;

        assigned
            .into_iter()
            .map(|a| match a {
                Some(id) => Target::Track(id),
                None => {
                    spawned += 1;
                    Target::Spawn(spawned - 1)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(cx: f32, cy: f32, side: f32) -> Detection {
        let h = side / 2.0;
        Detection::new("car", cx - h, cy - h, cx + h, cy + h)
    }

    fn store_with(points: &[(f32, f32)]) -> TrackStore {
        let mut store = TrackStore::new(None);
        for &(x, y) in points {
            store.spawn(1, &car(x, y, 100.0));
        }
        store
    }

    #[test]
    fn greedy_picks_first_track_in_gate() {
        let store = store_with(&[(100.0, 100.0), (110.0, 100.0)]);
        let targets = GreedyFirstFit.associate(&store, &[car(112.0, 100.0, 100.0)], 50.0);

        // track 2 is nearer, but track 1 comes first
        assert_eq!(targets, vec![Target::Track(1)]);
    }

    #[test]
    fn greedy_spawns_outside_gate() {
        let store = store_with(&[(100.0, 100.0)]);
        let targets = GreedyFirstFit.associate(&store, &[car(160.0, 100.0, 100.0)], 50.0);

        assert_eq!(targets, vec![Target::Spawn(0)]);
    }

    #[test]
    fn greedy_can_match_track_spawned_in_same_frame() {
        let store = TrackStore::new(None);
        let dets = [car(500.0, 500.0, 100.0), car(520.0, 500.0, 100.0), car(900.0, 500.0, 100.0)];

        assert_eq!(
            GreedyFirstFit.associate(&store, &dets, 50.0),
            vec![Target::Spawn(0), Target::Spawn(0), Target::Spawn(1)]
        );
    }

    #[test]
    fn greedy_reuses_matched_track() {
        let store = store_with(&[(100.0, 100.0)]);
        let dets = [car(110.0, 100.0, 100.0), car(130.0, 100.0, 100.0)];

        assert_eq!(
            GreedyFirstFit.associate(&store, &dets, 50.0),
            vec![Target::Track(1), Target::Track(1)]
        );
    }

    #[test]
    fn hungarian_assigns_nearest_globally() {
        let store = store_with(&[(100.0, 100.0), (140.0, 100.0)]);
        let dets = [car(138.0, 100.0, 100.0), car(102.0, 100.0, 100.0)];

        assert_eq!(
            Hungarian.associate(&store, &dets, 50.0),
            vec![Target::Track(2), Target::Track(1)]
        );
    }

    #[test]
    fn hungarian_gives_each_track_one_detection() {
        let store = store_with(&[(100.0, 100.0)]);
        let dets = [car(110.0, 100.0, 100.0), car(105.0, 100.0, 100.0)];

        assert_eq!(
            Hungarian.associate(&store, &dets, 50.0),
            vec![Target::Spawn(0), Target::Track(1)]
        );
    }

    #[test]
    fn hungarian_respects_gate() {
        let store = store_with(&[(100.0, 100.0)]);
        let dets = [car(160.0, 100.0, 100.0)];

        assert_eq!(Hungarian.associate(&store, &dets, 50.0), vec![Target::Spawn(0)]);
    }

    #[test]
    fn hungarian_ignores_unreachable_tracks() {
        let mut points = vec![(100.0, 100.0), (140.0, 100.0)];
        points.extend((0..300).map(|i| (2000.0 + i as f32 * 200.0, 900.0)));

        let mut store = store_with(&points);
        for t in store.iter_mut().filter(|t| t.id > 2) {
            t.active = false;
        }

        let dets = [car(138.0, 100.0, 100.0), car(102.0, 100.0, 100.0)];

        assert_eq!(
            Hungarian.associate(&store, &dets, 50.0),
            vec![Target::Track(2), Target::Track(1)]
        );
    }

    #[test]
    fn strategy_from_json() {
        let s: Strategy = serde_json::from_str("\"hungarian\"").unwrap();
        assert_eq!(s, Strategy::Hungarian);
    }
}
