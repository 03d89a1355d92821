use std::rc::Rc;

use super::*;
use crate::foundation::core::MediaKind;
use crate::media::clock::ManualClock;
use crate::media::handle::MediaErrorCode;
use crate::media::simulated::SimulatedHandle;

fn cfg() -> BackoffConfig {
    BackoffConfig {
        initial_delay_ms: 10,
        factor: 2.0,
        max_delay_ms: 40,
        max_attempts: 4,
    }
}

#[test]
fn backoff_grows_caps_and_exhausts() {
    let mut b = Backoff::new(&cfg());
    let delays: Vec<_> = std::iter::from_fn(|| b.next_delay()).collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(40),
            Duration::from_millis(40),
        ]
    );
    assert_eq!(b.attempts(), 4);
    b.reset();
    assert_eq!(b.next_delay(), Some(Duration::from_millis(10)));
}

#[test]
fn huge_growth_factor_saturates_at_the_cap() {
    let mut b = Backoff::new(&BackoffConfig {
        factor: f64::MAX,
        ..cfg()
    });
    assert_eq!(b.next_delay(), Some(Duration::from_millis(10)));
    assert_eq!(b.next_delay(), Some(Duration::from_millis(40)));
    assert_eq!(b.next_delay(), Some(Duration::from_millis(40)));
}

#[test]
fn blocking_wait_returns_once_buffered() {
    let clock = Rc::new(ManualClock::new());
    let handle = SimulatedHandle::new("a.mp4", MediaKind::Video, 5.0, clock.clone())
        .with_load_latency(Duration::from_millis(55));

    wait_until_ready(
        &handle,
        ReadyState::HaveCurrentData,
        clock.as_ref(),
        &cfg(),
        Duration::from_secs(1),
    )
    .unwrap();
    assert!(clock.now() >= Duration::from_millis(55));
    assert!(clock.now() < Duration::from_millis(200));
}

#[test]
fn blocking_wait_times_out() {
    let clock = Rc::new(ManualClock::new());
    let handle = SimulatedHandle::new("a.mp4", MediaKind::Video, 5.0, clock.clone())
        .with_load_latency(Duration::from_secs(60));

    let err = wait_until_ready(
        &handle,
        ReadyState::HaveCurrentData,
        clock.as_ref(),
        &cfg(),
        Duration::from_millis(300),
    )
    .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(clock.now(), Duration::from_millis(300));
}

#[test]
fn blocking_wait_surfaces_media_errors() {
    let clock = Rc::new(ManualClock::new());
    let mut handle = SimulatedHandle::new("a.mp4", MediaKind::Video, 5.0, clock.clone());
    handle.fail_with(MediaErrorCode::Decode);

    let err = wait_until_ready(
        &handle,
        ReadyState::HaveCurrentData,
        clock.as_ref(),
        &cfg(),
        Duration::from_secs(1),
    )
    .unwrap_err();
    assert!(matches!(err, ScenecastError::Media(_)));
}

#[test]
fn gate_polls_on_schedule_then_times_out() {
    let clock = Rc::new(ManualClock::new());
    let handle = SimulatedHandle::new("a.mp4", MediaKind::Audio, 5.0, clock.clone())
        .with_load_latency(Duration::from_secs(60));
    let mut gate = ReadinessGate::new(&cfg());

    assert!(!gate.poll(&handle, ReadyState::HaveCurrentData, clock.now()).unwrap());
    assert_eq!(
        gate.state(),
        Readiness::AwaitingReady {
            attempt: 1,
            next_poll: Duration::from_millis(10)
        }
    );

    // Before the scheduled poll nothing changes.
    clock.advance(Duration::from_millis(5));
    assert!(!gate.poll(&handle, ReadyState::HaveCurrentData, clock.now()).unwrap());
    assert!(matches!(
        gate.state(),
        Readiness::AwaitingReady { attempt: 1, .. }
    ));

    let mut outcome = Ok(false);
    for _ in 0..10 {
        clock.advance(Duration::from_millis(50));
        outcome = gate.poll(&handle, ReadyState::HaveCurrentData, clock.now());
        if outcome.is_err() {
            break;
        }
    }
    assert!(outcome.unwrap_err().is_retryable());
    assert_eq!(gate.state(), Readiness::Idle);
}

#[test]
fn gate_reports_ready() {
    let clock = Rc::new(ManualClock::new());
    let handle = SimulatedHandle::new("a.mp4", MediaKind::Audio, 5.0, clock.clone())
        .with_load_latency(Duration::from_millis(15));
    let mut gate = ReadinessGate::new(&cfg());

    assert!(!gate.poll(&handle, ReadyState::HaveCurrentData, clock.now()).unwrap());
    clock.advance(Duration::from_millis(20));
    assert!(gate.poll(&handle, ReadyState::HaveCurrentData, clock.now()).unwrap());
    assert_eq!(gate.state(), Readiness::Ready);
}
