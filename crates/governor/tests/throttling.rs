use simcore_common::Priority;
use simcore_governor::{FrameBudgetGovernor, GovernorConfig};
use std::time::Duration;

fn micros(v: u64) -> Duration {
    Duration::from_micros(v)
}

#[test]
fn full_window_average_matches_mean() {
    let mut gov = FrameBudgetGovernor::default();
    let samples: Vec<u64> = (0..60).map(|i| (i * 37 % 23 + 1) * 250).collect();
    for &s in &samples {
        gov.record("terrain", micros(s));
    }

    let expected: f64 = samples.iter().map(|&s| s as f64 / 1000.0).sum::<f64>() / 60.0;
    let rec = gov.system("terrain").expect("recorded");
    assert!((rec.avg_time_ms() - expected).abs() < 1e-9);

    // A 61st sample evicts the first one.
    let before = rec.avg_time_ms();
    gov.record("terrain", micros(9_000));
    let after = gov.system("terrain").expect("recorded").avg_time_ms();
    let delta = (9.0 - samples[0] as f64 / 1000.0) / 60.0;
    assert!((after - before - delta).abs() < 1e-9);
}

#[test]
fn average_is_order_independent() {
    let samples: Vec<u64> = (1..=60).map(|i| i * 100).collect();
    let mut forward = FrameBudgetGovernor::default();
    let mut backward = FrameBudgetGovernor::default();
    for &s in &samples {
        forward.record("s", micros(s));
    }
    for &s in samples.iter().rev() {
        backward.record("s", micros(s));
    }
    let a = forward.system("s").expect("recorded").avg_time_ms();
    let b = backward.system("s").expect("recorded").avg_time_ms();
    assert!((a - b).abs() < 1e-9);
}

#[test]
fn low_priority_recovers_one_step_per_frame() {
    let mut gov = FrameBudgetGovernor::default();
    gov.register("rituals", Priority::Low);

    for _ in 0..5 {
        gov.begin_frame(20.0);
        gov.end_frame();
    }
    assert_eq!(gov.system("rituals").map(|r| r.frequency()), Some(4));

    let mut seen = vec![4];
    for _ in 0..6 {
        gov.begin_frame(60.0);
        gov.end_frame();
        seen.push(gov.system("rituals").map(|r| r.frequency()).unwrap_or(0));
    }
    assert_eq!(seen, vec![4, 3, 2, 1, 1, 1, 1]);
    for pair in seen.windows(2) {
        assert!(pair[0] - pair[1] <= 1);
    }
}

#[test]
fn critical_is_pinned_at_every_fps() {
    let mut gov = FrameBudgetGovernor::default();
    gov.register("physics", Priority::Critical);
    for fps in [0.0, 5.0, 29.9, 30.0, 44.0, 50.0, 55.0, 144.0, f32::NAN] {
        gov.begin_frame(fps);
        assert_eq!(gov.system("physics").map(|r| r.frequency()), Some(1), "fps {fps}");
        assert!(gov.should_run("physics", Priority::Critical));
    }
}

#[test]
fn custom_thresholds_apply() {
    let mut gov = FrameBudgetGovernor::new(GovernorConfig {
        fps_throttle_low: 50.0,
        fps_throttle_medium: 90.0,
        fps_recover: 110.0,
        low_frequency_under_load: 8,
        ..GovernorConfig::default()
    });
    gov.register("low", Priority::Low);
    gov.begin_frame(45.0);
    assert_eq!(gov.system("low").map(|r| r.frequency()), Some(8));
    gov.begin_frame(100.0);
    assert_eq!(gov.system("low").map(|r| r.frequency()), Some(8));
    gov.begin_frame(120.0);
    assert_eq!(gov.system("low").map(|r| r.frequency()), Some(7));
}

#[test]
fn report_serializes_to_json() {
    let mut gov = FrameBudgetGovernor::default();
    gov.register("geology", Priority::Low);
    gov.begin_frame(60.0);
    let json = serde_json::to_value(gov.performance_report()).expect("serializable");
    assert_eq!(json[0]["name"], "geology");
    assert_eq!(json[0]["priority"], "low");
    assert_eq!(json[0]["frequency"], 1);
}
