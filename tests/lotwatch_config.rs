use std::sync::Mutex;

use tempfile::NamedTempFile;

use lotwatch::config::LotwatchConfig;
use lotwatch::Device;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "LOTWATCH_CONFIG",
        "LOTWATCH_MODEL_PATH",
        "LOTWATCH_ZONES_PATH",
        "LOTWATCH_SOURCE",
        "LOTWATCH_DEVICE",
        "LOTWATCH_FRAME_SKIP",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "model_path": "models/lot_v2.onnx",
        "zones_path": "data/north_lot.json",
        "source": "stub://north_lot?frames=50",
        "detector": {
            "car_confidence": 0.4,
            "free_confidence": 0.25,
            "general_confidence": 0.25,
            "device": "cuda",
            "image_size": 800,
            "frame_skip": 2
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("LOTWATCH_CONFIG", file.path());
    std::env::set_var("LOTWATCH_SOURCE", "stub://override");
    std::env::set_var("LOTWATCH_FRAME_SKIP", "7");

    let cfg = LotwatchConfig::load().expect("load config");

    assert_eq!(cfg.model_path, "models/lot_v2.onnx");
    assert_eq!(cfg.zones_path, "data/north_lot.json");
    assert_eq!(cfg.source, "stub://override");
    assert_eq!(cfg.detector.car_confidence, 0.4);
    assert_eq!(cfg.detector.free_confidence, 0.25);
    assert_eq!(cfg.detector.general_confidence, 0.25);
    assert_eq!(cfg.detector.device, Device::Cuda);
    assert_eq!(cfg.detector.image_size, 800);
    assert_eq!(cfg.detector.frame_skip, 7);

    clear_env();
}

#[test]
fn defaults_apply_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = LotwatchConfig::load().expect("load config");
    assert_eq!(cfg.model_path, "models/best.onnx");
    assert_eq!(cfg.zones_path, "data/zones.json");
    assert_eq!(cfg.source, "stub://lot_camera");
    assert_eq!(cfg.detector.device, Device::Cpu);
    assert_eq!(cfg.detector.frame_skip, 5);

    clear_env();
}

#[test]
fn invalid_thresholds_fail_fast() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{"detector": {"car_confidence": 1.5}}"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("LOTWATCH_CONFIG", file.path());

    assert!(LotwatchConfig::load().is_err());

    clear_env();
}

#[test]
fn invalid_device_env_fails_fast() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("LOTWATCH_DEVICE", "tpu");
    assert!(LotwatchConfig::load().is_err());

    clear_env();
}
