use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_frame_conversions() {
    let fps = Fps::whole(30).unwrap();
    assert!((fps.frames_to_secs(150) - 5.0).abs() < 1e-12);
    assert_eq!(fps.secs_to_frames_floor(1.0), 30);
    assert_eq!(fps.secs_to_frames_floor(-1.0), 0);

    let ntsc = Fps::new(30_000, 1001).unwrap();
    assert!((ntsc.as_f64() - 29.97).abs() < 0.01);
}

#[test]
fn inclusive_range_covers_last_frame() {
    let r = FrameRange::from_inclusive(30, 149).unwrap();
    assert_eq!(r.len_frames(), 120);
    assert!(r.contains(FrameIndex(149)));
    assert!(!r.contains(FrameIndex(150)));
    assert_eq!(r.last(), Some(FrameIndex(149)));
    assert!(FrameRange::from_inclusive(3, 2).is_err());
    assert!(matches!(
        FrameRange::from_inclusive(0, u64::MAX),
        Err(ScenecastError::Validation(_))
    ));
}

#[test]
fn playback_mode_flags() {
    assert!(PlaybackMode::Playing.is_live());
    assert!(PlaybackMode::Presenting.is_live());
    assert!(!PlaybackMode::Paused.is_live());
    assert!(PlaybackMode::Rendering.is_rendering());
}

#[test]
fn rendering_context_time_follows_frame() {
    let ctx = FrameContext::rendering(FrameIndex(45), Fps::whole(30).unwrap());
    assert!((ctx.time - 1.5).abs() < 1e-12);
    assert_eq!(ctx.tick, 45);
    assert_eq!(ctx.mode, PlaybackMode::Rendering);
}

#[test]
fn modes_serialize_camel_case() {
    let json = serde_json::to_string(&PlaybackMode::Presenting).unwrap();
    assert_eq!(json, "\"presenting\"");
    let kind: MediaKind = serde_json::from_str("\"audio\"").unwrap();
    assert_eq!(kind, MediaKind::Audio);
}
