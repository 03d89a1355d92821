use super::*;

fn rec(key: &str, t: f64) -> AssetFrameRecord {
    AssetFrameRecord {
        key: key.to_string(),
        src: format!("{key}.mp4"),
        kind: MediaKind::Video,
        current_time: t,
        playback_rate: 1.0,
        volume: 1.0,
    }
}

fn fps30() -> Fps {
    Fps::whole(30).unwrap()
}

#[test]
fn reconstructs_span_and_duration() {
    let frames = vec![vec![rec("a", 0.0)], vec![rec("a", 0.5)], vec![rec("a", 1.0)]];
    let assets = extract_media_assets(&frames, fps30());
    assert_eq!(assets.len(), 1);
    let a = &assets[0];
    assert_eq!(a.key, "a");
    assert_eq!(a.start_in_video, 0);
    assert_eq!(a.end_in_video, 2);
    assert_eq!(a.duration, 3);
    assert_eq!(a.duration_in_seconds, 1.0);
    assert_eq!(a.trim_left_in_seconds, 0.0);
}

#[test]
fn single_frame_falls_back_to_frame_duration() {
    let frames = vec![vec![], vec![rec("a", 4.0)], vec![]];
    let assets = extract_media_assets(&frames, fps30());
    let a = &assets[0];
    assert_eq!(a.start_in_video, 1);
    assert_eq!(a.end_in_video, 1);
    assert_eq!(a.duration, 1);
    assert!((a.duration_in_seconds - 1.0 / 30.0).abs() < 1e-12);
    assert_eq!(a.trim_left_in_seconds, 4.0);
}

#[test]
fn rate_scales_measured_duration_and_first_values_win() {
    let mut first = rec("fast", 2.0);
    first.playback_rate = 2.0;
    first.volume = 0.5;
    let mut later = rec("fast", 4.0);
    later.playback_rate = 3.0;
    later.volume = 0.9;
    let assets = extract_media_assets(&[vec![first], vec![later]], fps30());
    let a = &assets[0];
    assert_eq!(a.playback_rate, 2.0);
    assert_eq!(a.volume, 0.5);
    assert_eq!(a.duration_in_seconds, 1.0);
}

#[test]
fn zero_rate_and_negative_volume_are_sanitized() {
    let mut frozen = rec("frozen", 1.0);
    frozen.playback_rate = 0.0;
    frozen.volume = -2.0;
    let frames = vec![vec![frozen.clone()], vec![frozen.clone()], vec![frozen]];
    let a = &extract_media_assets(&frames, fps30())[0];
    assert!((a.duration_in_seconds - 0.1).abs() < 1e-12);
    assert_eq!(a.volume, 0.0);
}

#[test]
fn assets_keep_first_appearance_order() {
    let frames = vec![
        vec![rec("b", 0.0)],
        vec![rec("b", 0.1), rec("a", 0.0)],
        vec![rec("a", 0.1)],
    ];
    let keys: Vec<_> = extract_media_assets(&frames, fps30())
        .into_iter()
        .map(|a| (a.key, a.start_in_video, a.end_in_video))
        .collect();
    assert_eq!(
        keys,
        vec![("b".to_string(), 0, 1), ("a".to_string(), 1, 2)]
    );
}

#[test]
fn records_deserialize_from_camel_case_json() {
    let json = r#"{"key":"v1","src":"clip.mp4","type":"audio","currentTime":1.5,"playbackRate":1.0,"volume":0.8}"#;
    let r: AssetFrameRecord = serde_json::from_str(json).unwrap();
    assert_eq!(r.kind, MediaKind::Audio);
    assert_eq!(r.current_time, 1.5);
}
