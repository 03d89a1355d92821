use std::rc::Rc;
use std::time::Duration;

use super::*;
use crate::foundation::core::Fps;
use crate::media::clock::ManualClock;
use crate::media::simulated::SimulatedHandle;

fn ctx(time: f64, mode: PlaybackMode, tick: u64) -> FrameContext {
    FrameContext {
        time,
        mode,
        fps: Fps::whole(30).unwrap(),
        tick,
    }
}

fn handle(clock: &Rc<ManualClock>, kind: MediaKind) -> SimulatedHandle {
    SimulatedHandle::new("clip.mp4", kind, 20.0, clock.clone())
}

#[test]
fn clamp_time_respects_duration_and_loop() {
    assert_eq!(clamp_time(12.0, Some(10.0), false), 10.0);
    assert_eq!(clamp_time(12.0, Some(10.0), true), 2.0);
    assert_eq!(clamp_time(-1.0, Some(10.0), false), 0.0);
    assert_eq!(clamp_time(-1.0, None, true), 0.0);
    assert_eq!(clamp_time(42.0, None, false), 42.0);
    assert_eq!(clamp_time(f64::NAN, Some(10.0), false), 0.0);
}

#[test]
fn repeated_seek_to_same_time_issues_one_native_seek() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Video);
    let mut sync = MediaSync::new(MediaKind::Video, SyncConfig::default());

    assert_eq!(
        sync.apply_seek(&mut h, 2.0),
        SeekOutcome::Issued { busy: false }
    );
    assert_eq!(sync.apply_seek(&mut h, 2.0), SeekOutcome::Skipped);
    assert_eq!(h.seek_count(), 1);
    assert_eq!(sync.applied_time(), Some(2.0));
}

#[test]
fn rate_change_keeps_time_continuous() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Video);
    let mut sync = MediaSync::new(MediaKind::Video, SyncConfig::default());

    sync.play();
    assert!(sync.is_playing());
    let state = sync
        .drive(&mut h, &ctx(0.0, PlaybackMode::Playing, 0), clock.as_ref())
        .unwrap();
    assert_eq!(state, SyncState::Playing);
    assert_eq!(h.play_count(), 1);

    clock.advance_secs(2.0);
    sync.drive(&mut h, &ctx(2.0, PlaybackMode::Playing, 1), clock.as_ref())
        .unwrap();
    assert!((sync.time() - 2.0).abs() < 1e-9);

    sync.set_playback_rate(2.0).unwrap();
    assert!((sync.time() - 2.0).abs() < 1e-9);
    assert!((sync.time_at(3.0) - 4.0).abs() < 1e-9);
    assert!(sync.set_playback_rate(-1.0).is_err());
}

#[test]
fn fast_seek_only_resyncs_beyond_tolerance() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Video).with_drift(0.2);
    let mut sync = MediaSync::new(MediaKind::Video, SyncConfig::default());

    sync.play();
    sync.drive(&mut h, &ctx(0.0, PlaybackMode::Playing, 0), clock.as_ref())
        .unwrap();
    assert_eq!(h.seek_count(), 1);

    clock.advance_secs(1.0);
    sync.drive(&mut h, &ctx(1.0, PlaybackMode::Playing, 1), clock.as_ref())
        .unwrap();
    assert_eq!(h.seek_count(), 1, "0.2s drift is tolerated for video");

    clock.advance_secs(5.0);
    sync.drive(&mut h, &ctx(6.0, PlaybackMode::Playing, 2), clock.as_ref())
        .unwrap();
    assert_eq!(h.seek_count(), 2);
    assert!((h.current_time() - 6.0).abs() < 1e-9);
}

#[test]
fn audio_tolerance_is_tighter_than_video() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Audio).with_drift(0.2);
    let mut sync = MediaSync::new(MediaKind::Audio, SyncConfig::default());
    assert_eq!(sync.drift_tolerance(), 0.3);

    sync.play();
    sync.drive(&mut h, &ctx(0.0, PlaybackMode::Playing, 0), clock.as_ref())
        .unwrap();
    clock.advance_secs(2.0);
    sync.drive(&mut h, &ctx(2.0, PlaybackMode::Playing, 1), clock.as_ref())
        .unwrap();
    assert_eq!(h.seek_count(), 2);
}

#[test]
fn rendering_waits_for_seek_completion() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Video).with_seek_latency(Duration::from_millis(30));
    let mut sync = MediaSync::new(MediaKind::Video, SyncConfig::default());
    sync.seek(1.0);

    let state = sync
        .drive(&mut h, &ctx(0.0, PlaybackMode::Rendering, 0), clock.as_ref())
        .unwrap();
    assert_eq!(state, SyncState::Synced);
    assert!(clock.now() >= Duration::from_millis(30));
    assert!(!h.is_seeking());
    assert!(h.is_paused());
    assert_eq!(h.current_time(), 1.0);
}

#[test]
fn rendering_timeout_is_retryable() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Video).with_load_latency(Duration::from_secs(60));
    let cfg = SyncConfig {
        readiness_timeout_ms: 100,
        ..SyncConfig::default()
    };
    let mut sync = MediaSync::new(MediaKind::Video, cfg);

    let err = sync
        .drive(&mut h, &ctx(0.0, PlaybackMode::Rendering, 0), clock.as_ref())
        .unwrap_err();
    assert!(matches!(err, ScenecastError::Timeout(_)));
    assert!(err.is_retryable());
    assert!(clock.now() >= Duration::from_millis(100));
}

#[test]
fn live_readiness_does_not_block() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Video).with_load_latency(Duration::from_millis(50));
    let mut sync = MediaSync::new(MediaKind::Video, SyncConfig::default());

    sync.play();
    let state = sync
        .drive(&mut h, &ctx(0.0, PlaybackMode::Playing, 0), clock.as_ref())
        .unwrap();
    assert_eq!(state, SyncState::Seeking);
    assert_eq!(clock.now(), Duration::ZERO);
    assert_eq!(h.play_count(), 0);
    assert!(sync.is_playing());
    assert!(matches!(sync.readiness(), Readiness::AwaitingReady { .. }));

    clock.advance(Duration::from_millis(60));
    let state = sync
        .drive(&mut h, &ctx(0.06, PlaybackMode::Playing, 1), clock.as_ref())
        .unwrap();
    assert_eq!(state, SyncState::Playing);
    assert_eq!(h.play_count(), 1);
}

#[test]
fn pause_persists_current_time() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Audio);
    let mut sync = MediaSync::new(MediaKind::Audio, SyncConfig::default());

    sync.play();
    sync.drive(&mut h, &ctx(0.0, PlaybackMode::Playing, 0), clock.as_ref())
        .unwrap();
    clock.advance_secs(1.5);
    sync.drive(&mut h, &ctx(1.5, PlaybackMode::Playing, 1), clock.as_ref())
        .unwrap();

    sync.pause();
    assert!((sync.time() - 1.5).abs() < 1e-9);
    let state = sync
        .drive(&mut h, &ctx(3.0, PlaybackMode::Paused, 2), clock.as_ref())
        .unwrap();
    assert_eq!(state, SyncState::Paused);
    assert!(h.is_paused());
    assert!((sync.time() - 1.5).abs() < 1e-9);
    assert!((h.current_time() - 1.5).abs() < 1e-9);
}

#[test]
fn looping_wraps_once_duration_is_known() {
    let clock = Rc::new(ManualClock::new());
    let mut h = SimulatedHandle::new("loop.wav", MediaKind::Audio, 10.0, clock.clone());
    let mut sync = MediaSync::new(MediaKind::Audio, SyncConfig::default());
    sync.set_loop(true);
    sync.drive(&mut h, &ctx(0.0, PlaybackMode::Paused, 0), clock.as_ref())
        .unwrap();
    assert_eq!(sync.duration(), Some(10.0));
    assert_eq!(sync.seek(12.0), 2.0);
}

#[test]
fn media_error_reverts_playing_outside_rendering() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Video);
    let mut sync = MediaSync::new(MediaKind::Video, SyncConfig::default());
    sync.play();
    h.fail_with(MediaErrorCode::Decode);

    let state = sync
        .drive(&mut h, &ctx(0.0, PlaybackMode::Playing, 0), clock.as_ref())
        .unwrap();
    assert_eq!(state, SyncState::Idle);
    assert!(!sync.is_playing());
}

#[test]
fn media_error_keeps_logical_playing_while_rendering() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Video);
    let mut sync = MediaSync::new(MediaKind::Video, SyncConfig::default());
    sync.play();
    h.fail_with(MediaErrorCode::Network);

    let state = sync
        .drive(&mut h, &ctx(0.5, PlaybackMode::Rendering, 0), clock.as_ref())
        .unwrap();
    assert_eq!(state, SyncState::Idle);
    assert!(sync.is_playing());
}

#[test]
fn detached_play_issues_native_play_immediately() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Audio);
    let mut sync = MediaSync::new(MediaKind::Audio, SyncConfig::default());
    assert!(!sync.has_context());

    sync.play_detached(&mut h);
    assert!(sync.is_playing());
    assert_eq!(h.play_count(), 1);
    assert!(!h.is_paused());
}

#[test]
fn running_native_clock_forgets_the_applied_time() {
    let clock = Rc::new(ManualClock::new());
    let mut h = handle(&clock, MediaKind::Audio);
    let mut sync = MediaSync::new(MediaKind::Audio, SyncConfig::default());

    sync.play();
    sync.drive(&mut h, &ctx(0.0, PlaybackMode::Playing, 0), clock.as_ref())
        .unwrap();
    assert_eq!(sync.applied_time(), None);

    clock.advance_secs(1.0);
    assert_eq!(sync.fast_seeked_media(&mut h, 1.0), SeekOutcome::Skipped);
    assert_eq!(sync.applied_time(), None);
    assert!(matches!(
        sync.apply_seek(&mut h, 0.0),
        SeekOutcome::Issued { .. }
    ));
}
