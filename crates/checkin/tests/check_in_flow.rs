//! End-to-end check-in scenarios against scripted collaborators

mod common;

use std::sync::Arc;
use std::time::Duration;

use camera_capture::CameraError;
use checkin::{
    ActiveStage, BatteryStatus, CheckInConfig, CheckInStateMachine, FallbackReason, Indicator,
    Language, MessageCatalog, MessageKey, Phase, SessionOutcome, TickOutcome,
};
use common::*;
use presence::DetectorError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_happy_path_after_dark_frame() {
    let mut h = harness(
        CheckInConfig::default(),
        FakeCamera::new(vec![DARK, WELL_LIT]),
        vec![Ok(confirmed(75))],
    );
    let started = Instant::now();

    let outcome = h.machine.run(&CancellationToken::new()).await;

    assert_eq!(outcome, SessionOutcome::CheckedIn);
    assert_eq!(h.machine.phase(), Phase::Success);
    assert_eq!(h.machine.counter().lighting_failures(), 1);
    assert_eq!(h.machine.counter().detection_failures(), 0);
    // Dark frame never reached the analyzer
    assert_eq!(h.analyzer.calls(), 1);
    assert_eq!(h.repo.count(), 1);
    assert_eq!(h.camera.releases(), 1);
    assert!(!h.camera.is_streaming());
    // Warm-up, one interval, then the confirmation delay
    assert!(started.elapsed() >= Duration::from_millis(5_500));
    assert!(started.elapsed() < Duration::from_secs(8));
}

#[tokio::test]
async fn test_camera_held_until_release() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), vec![Ok(confirmed(90))]);
    h.machine.start().await;

    assert_eq!(h.machine.tick().await, TickOutcome::CheckedIn);
    assert!(h.camera.is_streaming());
    assert_eq!(h.machine.state().indicator, Indicator::Success);

    h.machine.release_camera();
    assert!(!h.camera.is_streaming());
    assert_eq!(h.camera.releases(), 1);
}

#[tokio::test]
async fn test_success_emits_once_and_stops_sampling() {
    let mut h = harness(
        CheckInConfig::default(),
        FakeCamera::well_lit(),
        vec![Ok(confirmed(60)), Ok(confirmed(99))],
    );
    h.machine.start().await;
    assert_eq!(h.machine.tick().await, TickOutcome::CheckedIn);
    let frames = h.camera.frames();

    // Stray ticks after success
    for _ in 0..3 {
        assert_eq!(h.machine.tick().await, TickOutcome::Inactive);
    }

    assert_eq!(h.repo.count(), 1);
    assert_eq!(h.camera.frames(), frames);
    assert_eq!(h.analyzer.calls(), 1);
    assert_eq!(h.machine.last_record().map(|r| r.check_in.user_id.as_str()), Some(USER));
}

#[tokio::test]
async fn test_forced_fallback_after_two_no_face() {
    let mut h = harness(
        CheckInConfig::default(),
        FakeCamera::well_lit(),
        vec![Ok(no_face()), Ok(no_face())],
    );
    h.machine.start().await;

    assert_eq!(h.machine.tick().await, TickOutcome::DetectionFailure);
    assert_eq!(h.machine.state().attempts_remaining, 1);
    assert_eq!(h.machine.phase(), Phase::Active(ActiveStage::Scanning));

    assert_eq!(
        h.machine.tick().await,
        TickOutcome::FellBack(FallbackReason::DetectionBudget)
    );
    assert_eq!(h.machine.phase(), Phase::ManualFallback);
    assert_eq!(h.machine.state().attempts_remaining, 0);
    assert_eq!(h.repo.count(), 0);
    assert_eq!(h.camera.releases(), 1);
}

#[tokio::test]
async fn test_lighting_budget_alone_triggers_fallback() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::new(vec![DARK, GLARE]), vec![]);
    h.machine.start().await;

    assert_eq!(h.machine.tick().await, TickOutcome::LightingFailure);
    assert_eq!(
        h.machine.state().guidance,
        MessageCatalog::default().text(MessageKey::TooDark)
    );
    assert_eq!(
        h.machine.tick().await,
        TickOutcome::FellBack(FallbackReason::LightingBudget)
    );
    assert_eq!(h.machine.counter().detection_failures(), 0);
    assert_eq!(h.analyzer.calls(), 0);
    assert!(!h.camera.is_streaming());
}

#[tokio::test]
async fn test_remote_lighting_flags_count_as_lighting() {
    let dark_verdict = presence::DetectionVerdict {
        face_detected: true,
        is_too_dark: true,
        confidence: 30,
        ..Default::default()
    };
    let mut h = harness(
        CheckInConfig::default(),
        FakeCamera::well_lit(),
        vec![Ok(dark_verdict.clone()), Ok(dark_verdict)],
    );
    h.machine.start().await;

    assert_eq!(h.machine.tick().await, TickOutcome::LightingFailure);
    assert_eq!(
        h.machine.tick().await,
        TickOutcome::FellBack(FallbackReason::LightingBudget)
    );
    assert_eq!(h.machine.counter().detection_failures(), 0);
}

#[tokio::test]
async fn test_service_errors_count_as_detection_failures() {
    let mut h = harness(
        CheckInConfig::default(),
        FakeCamera::well_lit(),
        vec![
            Err(DetectorError::RateLimited),
            Err(DetectorError::MalformedResponse("missing confidence".into())),
        ],
    );
    h.machine.start().await;

    assert_eq!(h.machine.tick().await, TickOutcome::DetectionFailure);
    let rate_limited = MessageCatalog::default().text(MessageKey::RateLimited);
    assert!(h.machine.state().guidance.starts_with(rate_limited));

    assert_eq!(
        h.machine.tick().await,
        TickOutcome::FellBack(FallbackReason::DetectionBudget)
    );
}

#[tokio::test]
async fn test_off_center_never_counts() {
    let script = (0..10).map(|_| Ok(off_center("Move left"))).collect();
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), script);
    h.machine.start().await;

    for _ in 0..10 {
        assert_eq!(h.machine.tick().await, TickOutcome::Adjusting);
    }
    assert_eq!(h.machine.counter().detection_failures(), 0);
    assert_eq!(h.machine.state().guidance, "Move left");
    assert_eq!(h.machine.state().indicator, Indicator::Adjusting);
    assert_eq!(h.machine.phase(), Phase::Active(ActiveStage::Scanning));
}

#[tokio::test]
async fn test_low_confidence_is_adjusting() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), vec![Ok(confirmed(59))]);
    h.machine.start().await;
    assert_eq!(h.machine.tick().await, TickOutcome::Adjusting);
    assert_eq!(h.repo.count(), 0);
}

#[tokio::test]
async fn test_camera_error_goes_to_manual_and_confirm_bypasses_detection() {
    let mut config = CheckInConfig::default();
    config.language = Language::Chinese;
    let mut h = harness(config, FakeCamera::failing(CameraError::PermissionDenied), vec![]);

    assert_eq!(h.machine.start().await, Phase::ManualFallback);
    assert_eq!(
        h.machine.state().fallback_reason,
        Some(FallbackReason::Camera(CameraError::PermissionDenied))
    );
    assert_eq!(
        h.machine.state().guidance,
        MessageCatalog::new(Language::Chinese).text(MessageKey::CameraPermissionDenied)
    );

    assert!(h.machine.confirm_manually().await);
    assert_eq!(h.machine.phase(), Phase::Success);
    assert_eq!(h.repo.count(), 1);
    assert_eq!(h.camera.starts(), 1);
    assert_eq!(h.analyzer.calls(), 0);

    // Second tap is not a second check-in
    assert!(!h.machine.confirm_manually().await);
    assert_eq!(h.repo.count(), 1);
}

#[tokio::test]
async fn test_manual_confirm_rejected_outside_fallback() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), vec![]);
    assert!(!h.machine.confirm_manually().await);
    h.machine.start().await;
    assert!(!h.machine.confirm_manually().await);
    assert_eq!(h.repo.count(), 0);
}

#[tokio::test]
async fn test_retry_resets_budgets() {
    let mut h = harness(
        CheckInConfig::default(),
        FakeCamera::new(vec![DARK, WELL_LIT]),
        vec![Ok(no_face()), Ok(no_face())],
    );
    h.machine.start().await;
    h.machine.tick().await;
    h.machine.tick().await;
    assert_eq!(h.machine.tick().await, TickOutcome::FellBack(FallbackReason::DetectionBudget));
    assert_eq!(h.machine.counter().lighting_failures(), 1);

    assert_eq!(h.machine.retry().await, Phase::Active(ActiveStage::Scanning));
    assert_eq!(h.machine.counter().lighting_failures(), 0);
    assert_eq!(h.machine.counter().detection_failures(), 0);
    assert_eq!(h.machine.state().attempts_remaining, 2);
    assert_eq!(h.machine.state().fallback_reason, None);
    assert_eq!(h.camera.starts(), 2);
    assert!(h.camera.is_streaming());
}

#[tokio::test]
async fn test_camera_release_is_idempotent() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), vec![]);
    h.machine.release_camera();
    h.machine.close();
    h.machine.close();
    assert_eq!(h.camera.releases(), 0);

    h.machine.start().await;
    h.machine.close();
    h.machine.close();
    h.machine.release_camera();
    assert_eq!(h.camera.releases(), 1);
    assert_eq!(h.machine.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_start_ignored_while_active() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), vec![]);
    h.machine.start().await;
    assert_eq!(h.machine.start().await, Phase::Active(ActiveStage::Scanning));
    assert_eq!(h.camera.starts(), 1);
}

#[tokio::test]
async fn test_battery_included_only_when_shared() {
    let battery = BatteryStatus { level: 42, charging: true };

    let mut shared = CheckInConfig::default();
    shared.share_battery = true;
    let mut h = harness(shared, FakeCamera::well_lit(), vec![Ok(confirmed(80))]);
    h.machine = h.machine.with_telemetry(FixedBattery(battery));
    h.machine.start().await;
    h.machine.tick().await;
    let record = h.repo.latest(USER).unwrap().unwrap();
    assert_eq!(record.check_in.battery_level, Some(42));
    assert_eq!(record.check_in.is_charging, Some(true));

    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), vec![Ok(confirmed(80))]);
    h.machine = h.machine.with_telemetry(FixedBattery(battery));
    h.machine.start().await;
    h.machine.tick().await;
    let record = h.repo.latest(USER).unwrap().unwrap();
    assert_eq!(record.check_in.battery_level, None);
    assert_eq!(record.check_in.is_charging, None);
}

#[tokio::test]
async fn test_storage_failure_keeps_success() {
    let (camera, stats) = FakeCamera::well_lit();
    let analyzer = ScriptedAnalyzer::new(vec![Ok(confirmed(80))]);
    let mut machine =
        CheckInStateMachine::new(CheckInConfig::default(), USER, camera, Arc::clone(&analyzer), BrokenSink);
    machine.start().await;

    assert_eq!(machine.tick().await, TickOutcome::CheckedIn);
    assert_eq!(machine.phase(), Phase::Success);
    assert!(machine.last_record().is_none());
    assert!(machine.last_storage_error().is_some());
    assert!(stats.is_streaming());
}

#[tokio::test]
async fn test_state_changes_are_published() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), vec![Ok(off_center("Move closer"))]);
    let mut rx = h.machine.subscribe();

    h.machine.start().await;
    assert_eq!(rx.borrow_and_update().phase, Phase::Active(ActiveStage::Scanning));

    h.machine.tick().await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().guidance, "Move closer");
}

#[tokio::test(start_paused = true)]
async fn test_scanning_shown_while_analysis_pending() {
    let analyzer = ScriptedAnalyzer::slow(vec![Ok(off_center("Move closer"))], Duration::from_secs(1));
    let mut h = with_analyzer(CheckInConfig::default(), FakeCamera::well_lit(), analyzer);
    let mut rx = h.machine.subscribe();
    h.machine.start().await;
    rx.borrow_and_update();

    let watcher = tokio::spawn(async move {
        rx.changed().await.unwrap();
        rx.borrow_and_update().guidance.clone()
    });
    assert_eq!(h.machine.tick().await, TickOutcome::Adjusting);

    let scanning = MessageCatalog::default().text(MessageKey::Scanning);
    assert_eq!(watcher.await.unwrap(), scanning);
    assert_eq!(h.machine.state().guidance, "Move closer");
}

#[tokio::test(start_paused = true)]
async fn test_run_reports_camera_fallback() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::failing(CameraError::DeviceBusy), vec![]);
    let outcome = h.machine.run(&CancellationToken::new()).await;
    assert_eq!(
        outcome,
        SessionOutcome::ManualFallback(FallbackReason::Camera(CameraError::DeviceBusy))
    );
}

#[tokio::test(start_paused = true)]
async fn test_run_cancel_releases_camera() {
    let script = (0..100).map(|_| Ok(off_center("Move up"))).collect();
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), script);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        trigger.cancel();
    });

    let outcome = h.machine.run(&cancel).await;

    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(h.machine.phase(), Phase::Idle);
    assert_eq!(h.camera.releases(), 1);
    // Samples at 2s, 5s and 8s
    assert_eq!(h.analyzer.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_recording_keeps_check_in() {
    let (camera, stats) = FakeCamera::well_lit();
    let sink = SlowSink::new(Duration::from_millis(300));
    let mut machine = CheckInStateMachine::new(
        CheckInConfig::default(),
        USER,
        camera,
        ScriptedAnalyzer::new(vec![Ok(confirmed(90))]),
        Arc::clone(&sink),
    );
    let mut rx = machine.subscribe();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        // First sample at 2s; the insert is still in flight
        tokio::time::sleep(Duration::from_millis(2_100)).await;
        trigger.cancel();
    });

    let outcome = machine.run(&cancel).await;

    assert_eq!(outcome, SessionOutcome::CheckedIn);
    assert_eq!(sink.inserts(), 1);
    assert_eq!(sink.repo.count(), 1);
    assert!(machine.last_record().is_some());
    assert_eq!(rx.borrow_and_update().phase, Phase::Success);
    assert!(!stats.is_streaming());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_analysis_records_nothing() {
    let analyzer = ScriptedAnalyzer::slow(vec![Ok(confirmed(90))], Duration::from_secs(1));
    let mut h = with_analyzer(CheckInConfig::default(), FakeCamera::well_lit(), analyzer);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        trigger.cancel();
    });

    assert_eq!(h.machine.run(&cancel).await, SessionOutcome::Cancelled);
    assert_eq!(h.machine.phase(), Phase::Idle);
    assert_eq!(h.repo.count(), 0);
    assert_eq!(h.camera.releases(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_sample_before_warmup() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), vec![]);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_900)).await;
        trigger.cancel();
    });

    assert_eq!(h.machine.run(&cancel).await, SessionOutcome::Cancelled);
    assert_eq!(h.camera.frames(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_analysis_drops_ticks() {
    let analyzer = ScriptedAnalyzer::slow(
        vec![Ok(no_face()), Ok(confirmed(80))],
        Duration::from_secs(10),
    );
    let mut h = with_analyzer(CheckInConfig::default(), FakeCamera::well_lit(), analyzer);

    let outcome = h.machine.run(&CancellationToken::new()).await;

    assert_eq!(outcome, SessionOutcome::CheckedIn);
    // Ticks that came due during the first analysis were not queued
    assert_eq!(h.analyzer.calls(), 2);
    assert_eq!(h.camera.frames(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_hold_confirmation_returns_to_idle() {
    let mut h = harness(CheckInConfig::default(), FakeCamera::well_lit(), vec![Ok(confirmed(80))]);
    assert_eq!(h.machine.run(&CancellationToken::new()).await, SessionOutcome::CheckedIn);

    let before = Instant::now();
    h.machine.hold_confirmation().await;
    assert!(before.elapsed() >= Duration::from_secs(3));
    assert_eq!(h.machine.phase(), Phase::Idle);

    // A fresh session may start again
    assert!(matches!(h.machine.start().await, Phase::Active(_)));
}
