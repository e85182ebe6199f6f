use linespeed::association::Strategy;
use linespeed::clock::{FrameRate, TimestampSource, Timestamps};
use linespeed::error::Error;
use linespeed::{CaptureEvent, Config, Detection, Frame, SpeedTracker, Tracking};

const DIMS: (u32, u32) = (1920, 1080);

fn square(label: &str, cx: f32, cy: f32, side: f32) -> Detection {
    let h = side / 2.0;
    Detection::new(label, cx - h, cy - h, cx + h, cy + h)
}

fn tracker(cfg: Config) -> SpeedTracker {
    SpeedTracker::new(cfg).unwrap()
}

fn frame_rate(fps: f64) -> Config {
    Config {
        timestamps: Timestamps::FrameRate { fps },
        ..Default::default()
    }
}

fn feed(t: &mut SpeedTracker, src: &str, index: u64, dets: Vec<Detection>) -> Vec<CaptureEvent> {
    t.update(&Frame::new(index, DIMS, dets), src)
        .unwrap()
        .map(|r| r.events)
        .unwrap_or_default()
}

/// Car at row 150 on frame 100 and row 700 on frame 120
fn drive(t: &mut SpeedTracker, src: &str, cx: f32) -> Vec<CaptureEvent> {
    let mut events = Vec::new();

    for i in 98..=122u64 {
        let y = 150.0 + (i as f32 - 100.0) * 27.5;
        events.extend(feed(t, src, i, vec![square("car", cx, y, 100.0)]));
    }

    events
}

#[test]
fn measures_135_kmh_from_frame_rate() {
    let mut t = tracker(frame_rate(10.0));
    let events = drive(&mut t, "cam", 960.0);

    assert_eq!(events.len(), 1);
    assert!((events[0].speed_kmh - 135.0).abs() < 1e-9);
    assert_eq!(events[0].file_stem(), "vehicle_1_car_135.0kmh");

    let tracks = t.tracks("cam");
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].line1_timestamp, Some(10.0));
    assert_eq!(tracks[0].line2_timestamp, Some(12.0));
    assert_eq!(tracks[0].elapsed_time, Some(2.0));
    assert!(tracks[0].plate_captured);
}

#[test]
fn skipped_frames_and_distance_compensation() {
    let mut t = tracker(Config {
        skip_factor: 3,
        ..frame_rate(15.0)
    });

    let mut events = Vec::new();
    let mut processed = 0;

    for i in 147..=186u64 {
        let y = 150.0 + (i as f32 - 150.0) * 550.0 / 30.0;
        let frame = Frame::new(i, DIMS, vec![square("car", 960.0, y, 200.0)]);

        match t.update(&frame, "cam").unwrap() {
            Some(report) => {
                assert_eq!(i % 3, 0);
                processed += 1;
                events.extend(report.events);
            }
            None => assert_ne!(i % 3, 0),
        }
    }

    assert_eq!(processed, 14);
    assert_eq!(events.len(), 1);
    assert!((events[0].speed_kmh - 45.0).abs() < 1e-9);
    assert_eq!(t.scene("cam").unwrap().diagnostics().processed_frames, 14);
}

#[test]
fn reverse_direction_never_gets_speed() {
    let mut t = tracker(frame_rate(10.0));

    for i in 0..=24u64 {
        let y = 730.0 - i as f32 * 27.5;
        let events = feed(&mut t, "cam", i, vec![square("car", 960.0, y, 100.0)]);
        assert!(events.is_empty());
    }

    let tracks = t.tracks("cam");
    assert_eq!(tracks.len(), 1);
    assert!(tracks[0].line2_timestamp.is_some());
    assert!(tracks[0].line1_timestamp.is_some());
    assert_eq!(tracks[0].speed, None);
    assert_eq!(t.scene("cam").unwrap().diagnostics().line2_first, 1);
}

#[test]
fn ids_increase_and_streams_are_independent() {
    let mut t = tracker(frame_rate(10.0));

    feed(&mut t, "a", 1, vec![square("car", 100.0, 400.0, 100.0)]);
    feed(
        &mut t,
        "a",
        2,
        vec![
            square("car", 100.0, 400.0, 100.0),
            square("bus", 600.0, 400.0, 100.0),
            square("van", 1200.0, 400.0, 100.0),
        ],
    );
    feed(&mut t, "b", 1, vec![square("truck", 100.0, 400.0, 100.0)]);

    let a: Vec<u32> = t.tracks("a").iter().map(|t| t.track_id).collect();
    let b: Vec<u32> = t.tracks("b").iter().map(|t| t.track_id).collect();

    assert_eq!(a, vec![1, 2, 3]);
    assert_eq!(b, vec![1]);
    assert!(t.tracks("unknown").is_empty());
}

#[test]
fn absence_window_removes_unmeasured_tracks() {
    let mut t = tracker(frame_rate(10.0));

    feed(&mut t, "cam", 1, vec![square("car", 500.0, 400.0, 100.0)]);

    for i in 2..=31u64 {
        feed(&mut t, "cam", i, vec![]);
    }
    let tracks = t.tracks("cam");
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].frames_absent, 30);

    feed(&mut t, "cam", 32, vec![]);
    assert!(t.tracks("cam").is_empty());
    assert_eq!(t.scene("cam").unwrap().diagnostics().removed, 1);
}

#[test]
fn measured_tracks_are_frozen_not_removed() {
    let mut t = tracker(frame_rate(10.0));
    drive(&mut t, "cam", 960.0);

    for i in 123..=153u64 {
        feed(&mut t, "cam", i, vec![]);
    }

    let tracks = t.tracks("cam");
    assert_eq!(tracks.len(), 1);
    assert!(!tracks[0].active);
    assert!((tracks[0].speed.unwrap() - 135.0).abs() < 1e-9);

    let scene = t.scene("cam").unwrap();
    assert_eq!(scene.active_count(), 0);
    assert!(scene.active_tracks().is_empty());
    assert_eq!(scene.diagnostics().frozen, 1);
}

#[test]
fn retention_cap_evicts_oldest_frozen_track() {
    let mut t = tracker(Config {
        retention_cap: Some(1),
        ..frame_rate(10.0)
    });

    // two cars side by side, measured on the same frames
    for i in 98..=122u64 {
        let y = 150.0 + (i as f32 - 100.0) * 27.5;
        let dets = vec![square("car", 400.0, y, 100.0), square("bus", 1400.0, y, 100.0)];
        feed(&mut t, "cam", i, dets);
    }

    // the bus stays in view a little longer, so the car is the older one
    for i in 123..=127u64 {
        feed(&mut t, "cam", i, vec![square("bus", 1400.0, 727.5, 100.0)]);
    }

    for i in 128..=170u64 {
        feed(&mut t, "cam", i, vec![]);
    }

    let tracks = t.tracks("cam");
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].label, "bus");
    assert_eq!(t.scene("cam").unwrap().diagnostics().evicted, 1);
}

#[test]
fn downscaled_detections_are_mapped_to_original_frame() {
    let mut t = tracker(Config {
        processing_scale: 0.5,
        ..frame_rate(10.0)
    });

    feed(&mut t, "cam", 1, vec![Detection::new("car", 100.0, 200.0, 150.0, 250.0)]);

    let tracks = t.tracks("cam");
    assert_eq!(tracks[0].bbox.as_slice(), &[200.0, 400.0, 300.0, 500.0]);
}

#[test]
fn non_target_labels_are_ignored() {
    let mut t = tracker(frame_rate(10.0));

    feed(
        &mut t,
        "cam",
        1,
        vec![
            square("person", 100.0, 400.0, 100.0),
            square("car", 600.0, 400.0, 100.0),
        ],
    );

    let tracks = t.tracks("cam");
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].label, "car");
    assert_eq!(t.scene("cam").unwrap().diagnostics().filtered_detections, 1);
}

#[test]
fn hungarian_strategy_is_selectable() {
    let mut t = tracker(Config {
        association: Strategy::Hungarian,
        ..frame_rate(10.0)
    });

    let events = drive(&mut t, "cam", 960.0);

    assert_eq!(events.len(), 1);
    assert!((events[0].speed_kmh - 135.0).abs() < 1e-9);
}

struct Rewind(Vec<f64>);

impl TimestampSource for Rewind {
    fn timestamp(&mut self, _frame_index: u64) -> f64 {
        self.0.remove(0)
    }
}

#[test]
fn backwards_clock_is_an_error() {
    let mut t =
        SpeedTracker::with_clock(Config::default(), Box::new(Rewind(vec![2.0, 1.0]))).unwrap();

    assert!(t.update(&Frame::new(1, DIMS, vec![]), "cam").is_ok());
    assert!(matches!(
        t.update(&Frame::new(2, DIMS, vec![]), "cam"),
        Err(Error::NonMonotonicTimestamp { .. })
    ));
}

#[test]
fn invalid_config_is_rejected() {
    assert!(matches!(
        SpeedTracker::new(Config {
            real_distance_m: 0.0,
            ..Default::default()
        }),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn custom_clock_does_not_bypass_validation() {
    let cfg = Config {
        skip_factor: 0,
        ..Default::default()
    };

    assert!(matches!(
        SpeedTracker::with_clock(cfg, Box::new(FrameRate { fps: 10.0 })),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn fractional_boxes_are_truncated_at_unit_scale() {
    let mut t = tracker(frame_rate(10.0));

    feed(&mut t, "cam", 1, vec![Detection::new("car", 100.4, 200.9, 150.5, 250.2)]);

    let tracks = t.tracks("cam");
    assert_eq!(tracks[0].bbox.as_slice(), &[100.0, 200.0, 150.0, 250.0]);
}
