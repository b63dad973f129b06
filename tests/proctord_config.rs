use std::sync::Mutex;

use tempfile::NamedTempFile;

use proctor_kernel::config::ProctordConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PROCTOR_CONFIG",
        "PROCTOR_DB_PATH",
        "PROCTOR_SCREENSHOT_DIR",
        "PROCTOR_SESSION_ID",
        "PROCTOR_SOURCE_URL",
        "PROCTOR_SENSITIVITY",
        "PROCTOR_INTERVAL_SECS",
        "PROCTOR_PROHIBITED",
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
        "db_path": "exam_hall.db",
        "screenshot_dir": "evidence",
        "session_id": "session:midterm_3",
        "source": {
            "url": "stub://seat_14",
            "width": 800,
            "height": 600,
            "interval_secs": 5
        },
        "detection": {
            "sensitivity": 20,
            "prohibited": ["cell phone", "book"],
            "head_grace_frames": 2,
            "hand_grace_frames": 4
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("PROCTOR_CONFIG", file.path());
    std::env::set_var("PROCTOR_SESSION_ID", "session:midterm_3_retake");
    std::env::set_var("PROCTOR_SENSITIVITY", "40");

    let cfg = ProctordConfig::load().expect("load config");
    clear_env();

    assert_eq!(cfg.db_path, "exam_hall.db");
    assert_eq!(cfg.screenshot_dir, "evidence");
    assert_eq!(cfg.session_id, "session:midterm_3_retake");
    assert_eq!(cfg.source.url, "stub://seat_14");
    assert_eq!(cfg.source.width, 800);
    assert_eq!(cfg.source.height, 600);
    assert_eq!(cfg.source.interval_secs, 5);
    assert_eq!(cfg.sensitivity, 40);
    assert_eq!(cfg.prohibited, ["cell phone", "book"]);
    assert_eq!(cfg.head_grace_frames, 2);
    assert_eq!(cfg.hand_grace_frames, 4);
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ProctordConfig::load().expect("load defaults");

    assert_eq!(cfg.db_path, "proctor.db");
    assert_eq!(cfg.session_id, "session:demo");
    assert_eq!(cfg.source.url, "stub://webcam");
    assert_eq!(cfg.source.interval_secs, 2);

    let detection = cfg.detection_config().expect("detection config");
    assert_eq!(detection.sensitivity(), 30);
    assert!(!detection.prohibited_classes().is_empty());
}

#[test]
fn invalid_session_id_fails_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PROCTOR_SESSION_ID", "not a session");
    let result = ProctordConfig::load();
    clear_env();
    assert!(result.is_err());
}

#[test]
fn out_of_range_sensitivity_fails_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PROCTOR_SENSITIVITY", "99");
    let result = ProctordConfig::load();
    clear_env();
    assert!(result.is_err());
}

#[test]
fn prohibited_env_csv_replaces_the_deny_list() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PROCTOR_PROHIBITED", "cell phone, laptop ,book");
    let cfg = ProctordConfig::load().expect("load config");
    clear_env();

    assert_eq!(cfg.prohibited, ["cell phone", "laptop", "book"]);
}

#[test]
fn zero_interval_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PROCTOR_INTERVAL_SECS", "0");
    let result = ProctordConfig::load();
    clear_env();
    assert!(result.is_err());
}
