use printscope::core::types::{AnomalyType, Severity};
use printscope::detectors::anomaly::analyze_anomalies;
use printscope::detectors::consistency::analyze_consistency;
use printscope::pipeline::rarity::rarity_of;
use printscope::pipeline::uniqueness::analyze_uniqueness;
use printscope::{analyze_fingerprint, SignalBundle};

const WINDOWS_CHROME: &str = include_str!("../fixtures/bundles/windows_chrome.json");

fn bundle() -> SignalBundle {
    SignalBundle::from_json(WINDOWS_CHROME).unwrap()
}

#[test]
fn webdriver_fails_critical_rule() {
    let mut b = bundle();
    b.navigator.webdriver = true;
    let consistency = analyze_consistency(&b);
    let rule = consistency
        .rules
        .iter()
        .find(|r| r.id == "webdriver_flag")
        .unwrap();
    assert!(!rule.passed);
    assert_eq!(rule.severity, Severity::Critical);
    assert!(consistency.overall_score <= 80);
    assert!(consistency
        .critical_issues
        .iter()
        .any(|issue| issue.id == "webdriver_flag"));
}

#[test]
fn virtualbox_renderer_raises_virtualization() {
    let mut b = bundle();
    b.webgl.renderer = "ANGLE (VirtualBox)".into();
    let anomaly = analyze_anomalies(&b);
    assert!(anomaly
        .detected_anomalies
        .iter()
        .any(|a| a.anomaly_type == AnomalyType::Virtualization));
    assert!(anomaly.virtualization_probability > 0.0);
}

#[test]
fn popular_hardware_is_less_unique_than_rare_hardware() {
    let popular = bundle();
    assert_eq!(popular.hardware.screen.resolution(), "1920x1080");
    assert_eq!(popular.hardware.cpu_cores, 8);
    assert_eq!(popular.navigator.platform, "Win32");

    let mut rare = bundle();
    rare.hardware.screen.width = 3001;
    rare.hardware.screen.height = 1999;
    rare.hardware.cpu_cores = 22;
    rare.hardware.memory = Some(0.5);
    rare.navigator.platform = "Win64".into();

    let popular_score = analyze_uniqueness(&popular).overall_score;
    let rare_score = analyze_uniqueness(&rare).overall_score;
    assert!(
        rare_score >= popular_score + 3,
        "popular {popular_score} vs rare {rare_score}"
    );
}

#[test]
fn windows_ua_on_mac_platform_still_aggregates() {
    let mut b = bundle();
    b.navigator.platform = "MacIntel".into();
    let result = analyze_fingerprint(&b);
    let rule = result
        .consistency
        .rules
        .iter()
        .find(|r| r.id == "ua_platform_match")
        .unwrap();
    assert!(!rule.passed);
    assert!(result.overall_score <= 100);
}

#[test]
fn missing_fpjs_keeps_analysis_complete() {
    let with = bundle();
    let mut without = bundle();
    without.fpjs = None;

    let a = analyze_uniqueness(&with);
    let b = analyze_uniqueness(&without);
    assert_eq!(a.rarest_signals[0].signal, "fpjs_visitor_id");
    assert!(b
        .rarest_signals
        .iter()
        .all(|s| s.signal != "fpjs_visitor_id"));
    assert_eq!(b.rarest_signals.len(), 5);
    assert_eq!(b.common_signals.len(), 5);
    assert!(a.bits_of_entropy - b.bits_of_entropy > 32.9);

    let result = analyze_fingerprint(&without);
    assert!(!result.ai_report.summary.is_empty());
}

#[test]
fn scores_stay_in_range_under_hostile_input() {
    let mut b = bundle();
    b.navigator.webdriver = true;
    b.navigator.has_window_chrome = false;
    b.navigator.languages.clear();
    b.navigator.user_agent = "Mozilla/5.0 (X11; Linux x86_64) HeadlessChrome/120.0".into();
    b.navigator.window_globals = vec!["cdc_abc".into(), "_phantom".into()];
    b.webgl.renderer = "llvmpipe SwiftShader VMware".into();
    b.webgl.vendor = "unknown".into();
    b.webgl.extensions = vec!["WEBGL_fake_random".into()];
    b.hardware.cpu_cores = 1;
    b.hardware.memory = Some(1.0);
    b.hardware.screen.avail_width = 5000;
    b.misc.timezone_offset = 900;
    b.canvas.geometry_hash = b.canvas.text_hash.clone();
    b.audio.hash = "error".into();
    b.performance.timing_anomaly = true;

    let result = analyze_fingerprint(&b);
    for score in [
        result.overall_score,
        result.uniqueness.overall_score,
        result.consistency.overall_score,
        result.anomaly.overall_score,
    ] {
        assert!(score <= 100);
    }
    assert_eq!(result.anomaly.automation_probability, 0.95);
    assert!(result.anomaly.virtualization_probability <= 0.95);
    assert!(result.anomaly.modification_probability <= 0.95);
    assert!(result.anomaly.overall_score < 50);
}

#[test]
fn rarity_is_strictly_decreasing() {
    assert_eq!(rarity_of(0.0), 100);
    assert_eq!(rarity_of(1.0), 0);
    let steps: Vec<u8> = (0..=10u8).map(|i| rarity_of(f64::from(i) / 10.0)).collect();
    assert!(steps.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn analysis_is_idempotent() {
    let b = bundle();
    assert_eq!(analyze_fingerprint(&b), analyze_fingerprint(&b));
}

#[test]
fn engine_is_shareable_across_threads() {
    let b = bundle();
    let expected = analyze_fingerprint(&b);
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| analyze_fingerprint(&b))).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
