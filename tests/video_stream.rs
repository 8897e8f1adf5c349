//! End-to-end: zone file -> pipeline -> sampled stream over a synthetic
//! source, exercising the sampling cadence, the degraded paths, and the
//! error budget from the outside.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use lotwatch::{
    open_source, DetectionPipeline, DetectorSettings, Occupancy, RawDetection, StubModel,
    SyntheticConfig, SyntheticSource, ZoneRegistry,
};

/// Two zones authored for a 640x480 view, matching the synthetic source
/// resolution so coordinates pass through unscaled.
fn write_zone_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp zone file");
    let json = r#"[
        {"points": [[100, 300], [200, 300], [200, 400], [100, 400]]},
        {"points": [[300, 300], [400, 300], [400, 400], [300, 400]]}
    ]"#;
    file.write_all(json.as_bytes()).expect("write zones");
    file
}

fn lot_model() -> StubModel {
    StubModel::with_detections(vec![
        RawDetection {
            bbox: [120.0, 320.0, 180.0, 380.0],
            confidence: 0.9,
            class_name: "car".into(),
        },
        RawDetection {
            bbox: [320.0, 320.0, 380.0, 380.0],
            confidence: 0.8,
            class_name: "free".into(),
        },
    ])
}

fn build_pipeline(model: StubModel) -> DetectionPipeline {
    let zones = write_zone_file();
    let registry = ZoneRegistry::from_json_file(zones.path()).expect("load zones");
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.reference_resolution(), (640, 480));
    DetectionPipeline::new(
        registry,
        Arc::new(Mutex::new(model)),
        DetectorSettings::default(),
    )
    .expect("pipeline")
}

#[test]
fn sampled_stream_over_synthetic_source() {
    let mut pipeline = build_pipeline(lot_model());
    let source = open_source("stub://test_lot?frames=7").expect("open source");

    let results: Vec<_> = pipeline.sample_video(source, Some(2)).collect();

    let numbers: Vec<u64> = results.iter().map(|r| r.frame_number.unwrap()).collect();
    assert_eq!(numbers, vec![0, 3, 6]);

    for result in &results {
        assert_eq!(result.spots.len(), 2);
        assert_eq!(result.spots[0].status, Occupancy::Occupied);
        assert_eq!(result.spots[1].status, Occupancy::Free);

        let s = &result.summary;
        assert_eq!(s.total_spots, 2);
        assert_eq!(s.occupied_count + s.free_count + s.unknown_count, 2);
        assert_eq!(s.vacant_count, 1);
        assert_eq!(s.occupancy_rate, 50.0);
    }

    let json = serde_json::to_value(&results[1]).unwrap();
    assert_eq!(json["frame_number"], 3);
    assert_eq!(json["summary"]["occupancy_rate"], 50.0);
}

#[test]
fn exhausted_error_budget_ends_the_stream_without_results() {
    let mut pipeline = build_pipeline(lot_model());
    let fail_at: Vec<u64> = (0..10).collect();
    let source = SyntheticSource::new(SyntheticConfig {
        frames: 50,
        ..SyntheticConfig::default()
    })
    .with_read_errors(&fail_at);

    let results: Vec<_> = pipeline.sample_video(source, Some(0)).collect();
    assert!(results.is_empty());
}

#[test]
fn failing_model_degrades_every_sampled_frame_to_unknown() {
    let mut pipeline = build_pipeline(StubModel::failing());
    let source = open_source("stub://test_lot?frames=4").expect("open source");

    let results: Vec<_> = pipeline.sample_video(source, Some(1)).collect();
    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.summary.unknown_count, 2);
        assert_eq!(result.summary.occupied_count, 0);
        assert!(result.detections.is_empty());
    }
}

#[test]
fn skipped_frames_never_reach_the_model() {
    let zones = write_zone_file();
    let registry = ZoneRegistry::from_json_file(zones.path()).expect("load zones");
    let model = Arc::new(Mutex::new(lot_model()));
    let handle = model.clone();
    let mut pipeline =
        DetectionPipeline::new(registry, model, DetectorSettings::default()).expect("pipeline");

    let source = open_source("stub://test_lot?frames=9").expect("open source");
    let results: Vec<_> = pipeline.sample_video(source, Some(2)).collect();

    // 9 frames read, but only indices 0, 3, 6 were detected on.
    assert_eq!(results.len(), 3);
    assert_eq!(handle.lock().unwrap().calls(), 3);
}

#[test]
fn configured_frame_skip_is_the_default_cadence() {
    let mut pipeline = build_pipeline(lot_model());
    // DetectorSettings::default() has frame_skip = 5: indices 0, 6.
    let source = open_source("stub://test_lot?frames=8").expect("open source");

    let numbers: Vec<u64> = pipeline
        .sample_video(source, None)
        .map(|r| r.frame_number.unwrap())
        .collect();
    assert_eq!(numbers, vec![0, 6]);
}
