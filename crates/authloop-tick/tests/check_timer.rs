//! Integration tests for the periodic check timer.
//!
//! Uses `start_paused = true` so Tokio auto-advances time whenever the
//! runtime is idle; a 30 s interval resolves instantly.

use std::time::Duration;

use authloop_tick::{CheckTimer, CheckTimerConfig};

const THIRTY_SECS: Duration = Duration::from_secs(30);

/// The paused clock jumps to timer-wheel slots, which are 1 ms wide.
fn assert_about(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(5),
        "expected ~{expected:?}, got {actual:?}"
    );
}

// =========================================================================
// CheckTimerConfig
// =========================================================================

#[test]
fn test_default_config_checks_every_thirty_seconds() {
    let cfg = CheckTimerConfig::default();
    assert_eq!(cfg.interval, THIRTY_SECS);
    assert_eq!(cfg.initial_jitter, Duration::ZERO);
    assert!(!cfg.is_disabled());
}

#[test]
fn test_validated_raises_tiny_interval_to_minimum() {
    let cfg = CheckTimerConfig::with_interval(Duration::from_millis(1)).validated();
    assert_eq!(cfg.interval, CheckTimerConfig::MIN_INTERVAL);
}

#[test]
fn test_validated_keeps_zero_interval_disabled() {
    let cfg = CheckTimerConfig::with_interval(Duration::ZERO).validated();
    assert!(cfg.is_disabled());
}

#[test]
fn test_validated_caps_jitter_at_interval() {
    let cfg = CheckTimerConfig {
        interval: Duration::from_secs(1),
        initial_jitter: Duration::from_secs(10),
    }
    .validated();
    assert_eq!(cfg.initial_jitter, Duration::from_secs(1));
}

// =========================================================================
// Timer creation and accessors
// =========================================================================

#[tokio::test]
async fn test_timer_initial_state() {
    let t = CheckTimer::with_interval(THIRTY_SECS);
    assert_eq!(t.tick_count(), 0);
    assert_eq!(t.interval(), Some(THIRTY_SECS));
    assert!(!t.is_disabled());
}

#[tokio::test]
async fn test_zero_interval_timer_is_disabled() {
    let t = CheckTimer::with_interval(Duration::ZERO);
    assert!(t.is_disabled());
    assert_eq!(t.interval(), None);
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_after_one_interval() {
    let mut t = CheckTimer::with_interval(THIRTY_SECS);
    let start = tokio::time::Instant::now();

    let info = t.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert_eq!(info.missed, 0);
    assert_about(start.elapsed(), THIRTY_SECS);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_increment_monotonically() {
    let mut t = CheckTimer::with_interval(THIRTY_SECS);

    for expected in 1..=4 {
        let info = t.wait_for_tick().await;
        assert_eq!(info.tick, expected);
    }
    assert_eq!(t.tick_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_late_wakeup_reports_missed_and_does_not_burst() {
    let mut t = CheckTimer::with_interval(THIRTY_SECS);
    t.wait_for_tick().await;

    // Worker was stuck for a bit over three intervals.
    tokio::time::advance(THIRTY_SECS * 3 + Duration::from_secs(1)).await;
    let late = t.wait_for_tick().await;
    assert_eq!(late.tick, 2);
    assert_eq!(late.missed, 2);

    // The next tick is a full interval away, not immediate.
    let before = tokio::time::Instant::now();
    let next = t.wait_for_tick().await;
    assert_eq!(next.missed, 0);
    assert_about(before.elapsed(), THIRTY_SECS);
}

#[tokio::test(start_paused = true)]
async fn test_jitter_delays_first_tick_within_bounds() {
    let mut t = CheckTimer::new(CheckTimerConfig {
        interval: THIRTY_SECS,
        initial_jitter: Duration::from_secs(5),
    });
    let start = tokio::time::Instant::now();

    t.wait_for_tick().await;

    let elapsed = start.elapsed();
    assert!(elapsed >= THIRTY_SECS);
    assert!(elapsed < THIRTY_SECS + Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_timer_never_fires() {
    let mut t = CheckTimer::with_interval(Duration::ZERO);

    let result = tokio::time::timeout(Duration::from_secs(3600), t.wait_for_tick()).await;
    assert!(result.is_err(), "disabled timer should pend forever");
}

// =========================================================================
// select! loop pattern (mirrors the worker)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut t = CheckTimer::with_interval(THIRTY_SECS);
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(10);

    tokio::spawn(async move {
        // Three checks fit before the stop command.
        tokio::time::sleep(Duration::from_secs(100)).await;
        tx.send("stop").await.ok();
    });

    let mut checks = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            info = t.wait_for_tick() => {
                checks += 1;
                assert_eq!(info.tick, checks);
            }
        }
    }

    assert_eq!(checks, 3);
}
