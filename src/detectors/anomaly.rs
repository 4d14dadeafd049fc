//! Signatures of virtualization, automation, emulation and tampering.

use crate::core::bundle::{DeviceType, SignalBundle};
use crate::core::types::{AnomalyAnalysis, AnomalyType, IndicatorSeverity, RiskBand, ScoreBand};
use crate::detectors::{anomaly_score, probability, Detection, IndicatorSpec};

pub const VIRTUALIZATION_WEIGHT: f64 = 0.30;
pub const AUTOMATION_WEIGHT: f64 = 0.35;
pub const MODIFICATION_WEIGHT: f64 = 0.25;

const VM_RENDERERS: &[(&str, &str)] = &[
    ("virtualbox", "VirtualBox"),
    ("vmware", "VMware"),
    ("parallels", "Parallels"),
    ("qemu", "QEMU"),
    ("svga", "SVGA (VMware)"),
    ("gallium", "Gallium (Mesa VM)"),
    ("llvmpipe", "LLVMpipe (software)"),
    ("swiftshader", "SwiftShader (software)"),
    ("microsoft basic render", "Microsoft Basic Render"),
    ("nvlddmkm", "Remote Desktop"),
];

/// Globals injected by Selenium, Nightmare and PhantomJS drivers.
const AUTOMATION_GLOBALS: &[&str] = &[
    "__webdriver_script_fn",
    "__driver_evaluate",
    "__selenium_evaluate",
    "__nightmare",
    "_phantom",
    "callPhantom",
];

const CHROMEDRIVER_PREFIXES: &[&str] = &["cdc_", "wdc_"];

const TAMPERED_EXTENSION_MARKERS: &[&str] = &["spoof", "fake", "random"];

pub const INDICATORS: &[IndicatorSpec] = &[
    IndicatorSpec {
        id: "vm_gpu",
        name: "Virtual GPU",
        description: "GPU renderer points to a virtual machine",
        anomaly_type: AnomalyType::Virtualization,
        severity: IndicatorSeverity::High,
        detect: vm_gpu,
    },
    IndicatorSpec {
        id: "vm_cpu_cores",
        name: "Suspicious CPU core count",
        description: "Core count is typical for a minimal VM",
        anomaly_type: AnomalyType::Virtualization,
        severity: IndicatorSeverity::Low,
        detect: vm_cpu_cores,
    },
    IndicatorSpec {
        id: "vm_memory",
        name: "Suspicious memory size",
        description: "Memory size is typical for a minimal VM",
        anomaly_type: AnomalyType::Virtualization,
        severity: IndicatorSeverity::Low,
        detect: vm_memory,
    },
    IndicatorSpec {
        id: "automation_webdriver",
        name: "WebDriver detected",
        description: "Browser is driven by automation",
        anomaly_type: AnomalyType::Automation,
        severity: IndicatorSeverity::High,
        detect: automation_webdriver,
    },
    IndicatorSpec {
        id: "automation_chrome_driver",
        name: "ChromeDriver detected",
        description: "ChromeDriver variables are present",
        anomaly_type: AnomalyType::Automation,
        severity: IndicatorSeverity::High,
        detect: automation_chrome_driver,
    },
    IndicatorSpec {
        id: "automation_headless",
        name: "Headless browser",
        description: "Traits of a headless browser",
        anomaly_type: AnomalyType::Automation,
        severity: IndicatorSeverity::High,
        detect: automation_headless,
    },
    IndicatorSpec {
        id: "emulation_mobile",
        name: "Mobile emulation",
        description: "Desktop browser emulates a mobile device",
        anomaly_type: AnomalyType::Emulation,
        severity: IndicatorSeverity::Medium,
        detect: emulation_mobile,
    },
    IndicatorSpec {
        id: "emulation_touch",
        name: "Touch emulation",
        description: "Touch events are emulated",
        anomaly_type: AnomalyType::Emulation,
        severity: IndicatorSeverity::Low,
        detect: emulation_touch,
    },
    IndicatorSpec {
        id: "emulation_sensors",
        name: "Missing motion sensors",
        description: "Mobile device without any motion sensor",
        anomaly_type: AnomalyType::Emulation,
        severity: IndicatorSeverity::Low,
        detect: emulation_sensors,
    },
    IndicatorSpec {
        id: "modified_canvas",
        name: "Modified canvas",
        description: "Canvas output may be tampered with",
        anomaly_type: AnomalyType::Modification,
        severity: IndicatorSeverity::Medium,
        detect: modified_canvas,
    },
    IndicatorSpec {
        id: "modified_webgl",
        name: "Modified WebGL",
        description: "WebGL parameters may be altered",
        anomaly_type: AnomalyType::Modification,
        severity: IndicatorSeverity::Medium,
        detect: modified_webgl,
    },
    IndicatorSpec {
        id: "modified_audio",
        name: "Modified audio",
        description: "Audio fingerprint may be altered",
        anomaly_type: AnomalyType::Modification,
        severity: IndicatorSeverity::Low,
        detect: modified_audio,
    },
    IndicatorSpec {
        id: "modified_timing",
        name: "Modified timers",
        description: "High-resolution timers look clamped or jittered",
        anomaly_type: AnomalyType::Modification,
        severity: IndicatorSeverity::Low,
        detect: modified_timing,
    },
    IndicatorSpec {
        id: "privacy_tools",
        name: "Privacy tools",
        description: "Traits of anti-fingerprinting tools",
        anomaly_type: AnomalyType::Modification,
        severity: IndicatorSeverity::Low,
        detect: privacy_tools,
    },
    IndicatorSpec {
        id: "inconsistency_timezone",
        name: "Timezone mismatch",
        description: "Timezone offset is out of range",
        anomaly_type: AnomalyType::Inconsistency,
        severity: IndicatorSeverity::Medium,
        detect: inconsistency_timezone,
    },
    IndicatorSpec {
        id: "inconsistency_screen",
        name: "Screen mismatch",
        description: "Available and total screen sizes contradict each other",
        anomaly_type: AnomalyType::Inconsistency,
        severity: IndicatorSeverity::Low,
        detect: inconsistency_screen,
    },
    IndicatorSpec {
        id: "inconsistency_ua_platform",
        name: "UA / platform mismatch",
        description: "User-Agent and platform disagree",
        anomaly_type: AnomalyType::Inconsistency,
        severity: IndicatorSeverity::High,
        detect: inconsistency_ua_platform,
    },
    IndicatorSpec {
        id: "inconsistency_client_hints_mobile",
        name: "Client Hints mobile mismatch",
        description: "Client Hints mobile flag disagrees with the parsed device type",
        anomaly_type: AnomalyType::Inconsistency,
        severity: IndicatorSeverity::Medium,
        detect: inconsistency_client_hints_mobile,
    },
    IndicatorSpec {
        id: "inconsistency_language_list",
        name: "Language list mismatch",
        description: "Primary language is missing from navigator.languages",
        anomaly_type: AnomalyType::Inconsistency,
        severity: IndicatorSeverity::Low,
        detect: inconsistency_language_list,
    },
];

fn is_mobile_device(b: &SignalBundle) -> bool {
    matches!(
        b.parsed_ua.device.device_type,
        DeviceType::Mobile | DeviceType::Tablet
    )
}

fn vm_gpu(b: &SignalBundle) -> Detection {
    let renderer = b.webgl.renderer.to_lowercase();
    let mut d = Detection::default();
    for (keyword, label) in VM_RENDERERS {
        if renderer.contains(keyword) {
            d.push(format!("GPU renderer contains \"{keyword}\" ({label})"));
        }
    }
    d
}

fn vm_cpu_cores(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    if b.hardware.cpu_cores == 1 {
        d.push("Single CPU core, typical for a minimal VM");
    }
    d
}

fn vm_memory(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    if let Some(memory) = b.hardware.memory.filter(|m| *m <= 2.0) {
        d.push(format!("Only {memory} GB RAM, typical for a minimal VM"));
    }
    d
}

fn automation_webdriver(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    if b.navigator.webdriver {
        d.push("navigator.webdriver = true");
    }
    for global in AUTOMATION_GLOBALS {
        if b.navigator.window_globals.iter().any(|g| g == global) {
            d.push(format!("{global} is defined"));
        }
    }
    d
}

fn automation_chrome_driver(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    for key in &b.navigator.window_globals {
        if CHROMEDRIVER_PREFIXES.iter().any(|p| key.starts_with(p)) {
            d.push(format!("ChromeDriver variable: {key}"));
        }
    }
    d
}

fn automation_headless(b: &SignalBundle) -> Detection {
    let ua = b.ua_lower();
    let mut d = Detection::default();
    if ua.contains("headless") {
        d.push("User-Agent contains \"headless\"");
    }
    if ua.contains("phantom") {
        d.push("PhantomJS User-Agent");
    }
    if ua.contains("chrome") && !b.navigator.has_window_chrome {
        d.push("Chrome User-Agent without a window.chrome object");
    }
    if b.navigator.languages.is_empty() {
        d.push("navigator.languages is empty");
    }
    d
}

fn emulation_mobile(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    let has_touch = b.hardware.max_touch_points > 0;
    let small_screen = b.hardware.screen.shorter_side() < 768;
    if is_mobile_device(b) && !small_screen && !has_touch {
        d.push("Mobile User-Agent on a desktop-sized screen without touch");
    }
    d
}

fn emulation_touch(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    if b.hardware.max_touch_points > 0 && b.parsed_ua.device.device_type == DeviceType::Desktop {
        d.push("Touch points on a desktop device");
    }
    d
}

fn emulation_sensors(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    if is_mobile_device(b) && !b.sensors.any_motion_sensor() {
        d.push("Mobile device reports no accelerometer, gyroscope or motion events");
    }
    d
}

fn modified_canvas(b: &SignalBundle) -> Detection {
    let c = &b.canvas;
    let mut d = Detection::default();
    if c.text_hash == c.geometry_hash {
        d.push("Canvas text and geometry share one hash");
    }
    if c.text_hash.chars().count() < 4 {
        d.push("Canvas hash is unusually short");
    }
    if !c.supported && b.webgl.supported {
        d.push("Canvas is unsupported while WebGL works");
    }
    d
}

fn modified_webgl(b: &SignalBundle) -> Detection {
    let gl = &b.webgl;
    let mut d = Detection::default();
    if gl.supported && gl.vendor == "unknown" {
        d.push("WebGL vendor is unknown");
    }
    if gl.supported && gl.renderer == "unknown" {
        d.push("WebGL renderer is unknown");
    }
    let suspicious: Vec<&str> = gl
        .extensions
        .iter()
        .filter(|ext| {
            let lower = ext.to_lowercase();
            TAMPERED_EXTENSION_MARKERS.iter().any(|m| lower.contains(m))
        })
        .map(String::as_str)
        .collect();
    if !suspicious.is_empty() {
        d.push(format!("Suspicious extensions: {}", suspicious.join(", ")));
    }
    d
}

fn modified_audio(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    if !b.audio.supported && b.canvas.supported {
        d.push("AudioContext is unsupported");
    }
    if b.audio.hash == "error" {
        d.push("Audio fingerprint failed to compute");
    }
    d
}

fn modified_timing(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    if b.performance.timing_anomaly {
        d.push("Performance timers reported an anomaly");
    }
    d
}

fn privacy_tools(b: &SignalBundle) -> Detection {
    let browser = b.parsed_ua.browser.name.as_str();
    let screen = &b.hardware.screen;
    let firefox = browser == "Firefox";
    let standard_screen = screen.width == 1920 && screen.height == 1080;
    let mut d = Detection::default();

    if firefox && b.audio.sample_rate == 44_100 && standard_screen {
        d.push("Firefox resistFingerprinting may be enabled");
    }
    if browser == "Brave" {
        d.push("Brave ships built-in fingerprint protection");
    }
    let utc = b.misc.timezone == "UTC" || b.misc.timezone_offset == 0;
    if firefox && standard_screen && screen.color_depth == 24 && utc {
        d.push("Tor Browser may be in use");
    }
    d
}

fn inconsistency_timezone(b: &SignalBundle) -> Detection {
    let offset = b.misc.timezone_offset;
    let mut d = Detection::default();
    if offset.unsigned_abs() > 720 {
        d.push(format!("Timezone offset is out of range: {offset} minutes"));
    }
    d
}

fn inconsistency_screen(b: &SignalBundle) -> Detection {
    let s = &b.hardware.screen;
    let mut d = Detection::default();
    if s.avail_width > s.width || s.avail_height > s.height {
        d.push("Available screen is larger than the total screen");
    }
    if u64::from(s.avail_width) * 2 < u64::from(s.width)
        || u64::from(s.avail_height) * 2 < u64::from(s.height)
    {
        d.push("Available screen is far smaller than the total screen");
    }
    d
}

fn inconsistency_ua_platform(b: &SignalBundle) -> Detection {
    let ua = b.ua_lower();
    let platform = b.navigator.platform.to_lowercase();
    let shown = &b.navigator.platform;

    let windows_ua = ua.contains("windows");
    let mac_ua = ua.contains("mac os") || ua.contains("macintosh");
    let linux_ua = ua.contains("linux") && !ua.contains("android");
    let android_ua = ua.contains("android");
    let ios_ua = ua.contains("iphone") || ua.contains("ipad");

    let windows_platform = platform.contains("win");
    let mac_platform = platform.contains("mac");
    let linux_platform = platform.contains("linux");
    let ios_platform = platform.contains("iphone") || platform.contains("ipad");

    let mut d = Detection::default();
    if windows_ua && !windows_platform {
        d.push(format!("UA: Windows, platform: {shown}"));
    }
    if mac_ua && !mac_platform {
        d.push(format!("UA: macOS, platform: {shown}"));
    }
    if linux_ua && !linux_platform {
        d.push(format!("UA: Linux, platform: {shown}"));
    }
    if android_ua && !linux_platform {
        d.push(format!("UA: Android, platform: {shown}"));
    }
    if ios_ua && !ios_platform && !mac_platform {
        d.push(format!("UA: iOS, platform: {shown}"));
    }
    d
}

fn inconsistency_client_hints_mobile(b: &SignalBundle) -> Detection {
    let mut d = Detection::default();
    let Some(hints) = &b.navigator.user_agent_data else {
        return d;
    };
    let device = b.parsed_ua.device.device_type;
    if device == DeviceType::Unknown {
        return d;
    }
    let parsed_mobile = device == DeviceType::Mobile;
    if hints.mobile != parsed_mobile {
        d.push(format!(
            "Client Hints mobile = {}, parsed device type is {:?}",
            hints.mobile, device
        ));
    }
    d
}

fn inconsistency_language_list(b: &SignalBundle) -> Detection {
    let nav = &b.navigator;
    let mut d = Detection::default();
    if !nav.languages.is_empty() && !nav.languages.iter().any(|l| *l == nav.language) {
        d.push(format!(
            "navigator.language {} is not in navigator.languages",
            nav.language
        ));
    }
    d
}

pub fn analyze_anomalies(bundle: &SignalBundle) -> AnomalyAnalysis {
    let detected_anomalies: Vec<_> = INDICATORS
        .iter()
        .map(|spec| spec.evaluate(bundle))
        .filter(|i| i.detected)
        .collect();
    let count = |t: AnomalyType| detected_anomalies.iter().filter(|a| a.anomaly_type == t).count();

    let analysis = AnomalyAnalysis {
        overall_score: anomaly_score(&detected_anomalies),
        virtualization_probability: probability(
            count(AnomalyType::Virtualization),
            VIRTUALIZATION_WEIGHT,
        ),
        automation_probability: probability(count(AnomalyType::Automation), AUTOMATION_WEIGHT),
        modification_probability: probability(
            count(AnomalyType::Modification),
            MODIFICATION_WEIGHT,
        ),
        detected_anomalies,
    };

    tracing::debug!(
        detected = analysis.detected_anomalies.len(),
        overall_score = analysis.overall_score,
        "anomalies scored"
    );
    analysis
}

pub fn interpret_anomaly_score(score: u8) -> ScoreBand {
    let (level, description, risk_level) = match score {
        90.. => (
            "No anomalies",
            "No signs of virtualization, automation or browser modification.",
            RiskBand::None,
        ),
        70..=89 => (
            "Minor anomalies",
            "Some traits found that may come from your browser or its settings.",
            RiskBand::Low,
        ),
        50..=69 => (
            "Moderate anomalies",
            "Traits found that point to a modified browser or privacy tools.",
            RiskBand::Medium,
        ),
        _ => (
            "Significant anomalies",
            "Strong signs of virtualization, automation or modification. Some sites may behave differently.",
            RiskBand::High,
        ),
    };
    ScoreBand {
        level: level.to_string(),
        description: description.to_string(),
        risk_level,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::core::bundle::fixtures::windows_chrome;

    fn detected_ids(analysis: &AnomalyAnalysis) -> Vec<&str> {
        analysis
            .detected_anomalies
            .iter()
            .map(|a| a.id.as_str())
            .collect()
    }

    #[test]
    fn catalog_has_unique_ids() {
        assert_eq!(INDICATORS.len(), 19);
        let ids: HashSet<_> = INDICATORS.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), INDICATORS.len());
    }

    #[test]
    fn clean_bundle_has_no_anomalies() {
        let analysis = analyze_anomalies(&windows_chrome());
        assert!(analysis.detected_anomalies.is_empty(), "{:?}", detected_ids(&analysis));
        assert_eq!(analysis.overall_score, 100);
        assert_eq!(analysis.virtualization_probability, 0.0);
    }

    #[test]
    fn virtualbox_renderer_is_virtualization() {
        let mut bundle = windows_chrome();
        bundle.webgl.renderer = "ANGLE (VirtualBox)".into();
        let analysis = analyze_anomalies(&bundle);
        let vm = analysis
            .detected_anomalies
            .iter()
            .find(|a| a.id == "vm_gpu")
            .unwrap();
        assert_eq!(vm.anomaly_type, AnomalyType::Virtualization);
        assert!(vm.evidence[0].contains("VirtualBox"));
        assert!(analysis.virtualization_probability > 0.0);
        assert_eq!(analysis.overall_score, 85);
    }

    #[test]
    fn minimal_vm_hardware_stacks_probability() {
        let mut bundle = windows_chrome();
        bundle.webgl.renderer = "llvmpipe (LLVM 15.0.7, 256 bits)".into();
        bundle.hardware.cpu_cores = 1;
        bundle.hardware.memory = Some(2.0);
        let analysis = analyze_anomalies(&bundle);
        assert_eq!(analysis.count_of(AnomalyType::Virtualization), 3);
        assert!((analysis.virtualization_probability - 0.9).abs() < 1e-9);
        assert_eq!(analysis.overall_score, 100 - 15 - 3 - 3);
    }

    #[test]
    fn automation_globals_are_evidence() {
        let mut bundle = windows_chrome();
        bundle.navigator.webdriver = true;
        bundle.navigator.window_globals = vec![
            "__selenium_evaluate".into(),
            "cdc_adoQpoasnfa76pfcZLmcfl_Array".into(),
        ];
        let analysis = analyze_anomalies(&bundle);
        let ids = detected_ids(&analysis);
        assert!(ids.contains(&"automation_webdriver"));
        assert!(ids.contains(&"automation_chrome_driver"));
        let webdriver = &analysis.detected_anomalies[0];
        assert_eq!(webdriver.evidence.len(), 2);
        assert!((analysis.automation_probability - 0.7).abs() < 1e-9);
    }

    #[test]
    fn headless_signatures() {
        let mut bundle = windows_chrome();
        bundle.navigator.user_agent = bundle.navigator.user_agent.replace("Chrome/", "HeadlessChrome/");
        bundle.navigator.has_window_chrome = false;
        let analysis = analyze_anomalies(&bundle);
        let headless = analysis
            .detected_anomalies
            .iter()
            .find(|a| a.id == "automation_headless")
            .unwrap();
        assert_eq!(headless.evidence.len(), 2);
    }

    #[test]
    fn emulated_phone_on_desktop_screen() {
        let mut bundle = windows_chrome();
        bundle.parsed_ua.device.device_type = DeviceType::Mobile;
        bundle.sensors.device_motion = false;
        bundle.sensors.device_orientation = false;
        let ids: Vec<String> = analyze_anomalies(&bundle)
            .detected_anomalies
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert!(ids.contains(&"emulation_mobile".to_string()));
        assert!(ids.contains(&"emulation_sensors".to_string()));
        assert!(ids.contains(&"inconsistency_client_hints_mobile".to_string()));
    }

    #[test]
    fn tor_like_firefox() {
        let mut bundle = windows_chrome();
        bundle.parsed_ua.browser.name = "Firefox".into();
        bundle.audio.sample_rate = 44_100;
        bundle.misc.timezone = "UTC".into();
        bundle.misc.timezone_offset = 0;
        let analysis = analyze_anomalies(&bundle);
        let tools = analysis
            .detected_anomalies
            .iter()
            .find(|a| a.id == "privacy_tools")
            .unwrap();
        assert_eq!(tools.evidence.len(), 2);
        assert!((analysis.modification_probability - 0.25).abs() < 1e-9);
    }

    #[test]
    fn screen_and_timezone_inconsistencies() {
        let mut bundle = windows_chrome();
        bundle.hardware.screen.avail_width = 2560;
        bundle.hardware.screen.avail_height = 400;
        bundle.misc.timezone_offset = -840;
        let ids = detected_ids(&analyze_anomalies(&bundle))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert!(ids.contains(&"inconsistency_screen".to_string()));
        assert!(ids.contains(&"inconsistency_timezone".to_string()));
    }

    #[test]
    fn probabilities_never_reach_certainty() {
        let mut bundle = windows_chrome();
        bundle.navigator.webdriver = true;
        bundle.navigator.has_window_chrome = false;
        bundle.navigator.window_globals = vec!["cdc_x".into()];
        let analysis = analyze_anomalies(&bundle);
        assert_eq!(analysis.count_of(AnomalyType::Automation), 3);
        assert_eq!(analysis.automation_probability, 0.95);
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(interpret_anomaly_score(100).risk_level, RiskBand::None);
        assert_eq!(interpret_anomaly_score(70).risk_level, RiskBand::Low);
        assert_eq!(interpret_anomaly_score(50).risk_level, RiskBand::Medium);
        assert_eq!(interpret_anomaly_score(49).risk_level, RiskBand::High);
    }
}
