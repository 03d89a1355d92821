use super::*;

#[test]
fn sync_defaults_match_drift_tolerances() {
    let cfg = SyncConfig::default();
    assert_eq!(cfg.video_drift_tolerance, 1.0);
    assert_eq!(cfg.audio_drift_tolerance, 0.3);
    assert!(!cfg.allow_volume_amplification);
}

#[test]
fn partial_sync_json_fills_defaults() {
    let cfg: SyncConfig = serde_json::from_str(r#"{"audio_drift_tolerance":0.1}"#).unwrap();
    assert_eq!(cfg.audio_drift_tolerance, 0.1);
    assert_eq!(cfg.video_drift_tolerance, 1.0);
    assert_eq!(cfg.backoff, BackoffConfig::default());
}

#[test]
fn export_settings_parse_and_paths() {
    let json = r#"{
        "outputDir": "out",
        "outputFilename": "clip",
        "format": "webm",
        "fps": {"num": 30, "den": 1},
        "startFrame": 0,
        "endFrame": 149
    }"#;
    let s = ExportSettings::from_json(json).unwrap();
    assert_eq!(s.temp_dir, None);
    assert_eq!(s.format, OutputFormat::WebM);
    assert_eq!(s.range().unwrap().len_frames(), 150);
    assert_eq!(s.output_path(), PathBuf::from("out").join("clip.webm"));
}

#[test]
fn export_settings_reject_bad_values() {
    let base = ExportSettings {
        output_dir: PathBuf::from("out"),
        output_filename: "clip".to_string(),
        temp_dir: None,
        format: OutputFormat::Mp4,
        fps: Fps::whole(30).unwrap(),
        start_frame: 10,
        end_frame: 5,
    };
    assert!(base.validate().is_err());

    let nested = ExportSettings {
        output_filename: "a/b".to_string(),
        start_frame: 0,
        ..base.clone()
    };
    assert!(nested.validate().is_err());

    let unbounded = ExportSettings {
        start_frame: 0,
        end_frame: u64::MAX,
        ..base.clone()
    };
    assert!(matches!(
        unbounded.validate(),
        Err(ScenecastError::Validation(_))
    ));

    assert!(matches!(
        ExportSettings::from_json("{"),
        Err(ScenecastError::Serde(_))
    ));
}
