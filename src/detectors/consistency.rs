//! Plausibility checks between signals that should agree with each other.

use crate::core::bundle::SignalBundle;
use crate::core::types::{
    ConsistencyAnalysis, RiskBand, RuleCategory, RuleKind, ScoreBand, Severity,
};
use crate::detectors::{consistency_score, RuleSpec, Verdict};

const VM_RENDERER_KEYWORDS: &[&str] = &[
    "virtualbox",
    "vmware",
    "parallels",
    "qemu",
    "virtual",
    "svga",
    "gallium",
    "llvmpipe",
    "swiftshader",
    "microsoft basic render",
];

const COMMON_CORE_COUNTS: &[u32] = &[1, 2, 4, 6, 8, 10, 12, 14, 16, 20, 24, 32, 48, 64, 128];

/// `navigator.deviceMemory` is bucketed to these values.
const DEVICE_MEMORY_BUCKETS: &[f64] = &[0.25, 0.5, 1.0, 2.0, 4.0, 8.0];

const BLINK_BROWSERS: &[&str] = &["chrome", "edge", "brave", "opera", "vivaldi"];

const MIN_EXPECTED_MAJOR: &[(&str, u32)] = &[
    ("Chrome", 100),
    ("Firefox", 100),
    ("Edge", 100),
    ("Safari", 15),
    ("Opera", 80),
];

const TIMEZONE_LANGUAGES: &[(&str, &[&str])] = &[
    ("Europe/Moscow", &["ru"]),
    ("America/New_York", &["en"]),
    ("Europe/London", &["en"]),
    ("Asia/Tokyo", &["ja"]),
    ("Europe/Paris", &["fr"]),
    ("Europe/Berlin", &["de"]),
];

const WINDOWS_FONTS: &[&str] = &["arial", "times new roman", "tahoma", "verdana", "segoe ui"];
const MAC_FONTS: &[&str] = &["helvetica", "sf pro", "lucida grande", "geneva"];

const COMMON_SAMPLE_RATES: &[u32] = &[22_050, 44_100, 48_000, 96_000];

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "ua_platform_match",
        name: "UA / platform match",
        description: "User-Agent operating system agrees with navigator.platform",
        category: RuleCategory::UserAgent,
        severity: Severity::High,
        kind: RuleKind::Scored,
        check: ua_platform_match,
    },
    RuleSpec {
        id: "ua_gpu_match",
        name: "UA / GPU match",
        description: "GPU renderer is plausible for the claimed operating system",
        category: RuleCategory::Hardware,
        severity: Severity::Medium,
        kind: RuleKind::Scored,
        check: ua_gpu_match,
    },
    RuleSpec {
        id: "ua_screen_mobile",
        name: "Mobile screen size",
        description: "Mobile User-Agent comes with a mobile-sized screen",
        category: RuleCategory::Screen,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: ua_screen_mobile,
    },
    RuleSpec {
        id: "cpu_cores_realistic",
        name: "Realistic CPU core count",
        description: "hardwareConcurrency is a plausible core count",
        category: RuleCategory::Hardware,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: cpu_cores_realistic,
    },
    RuleSpec {
        id: "memory_realistic",
        name: "Realistic device memory",
        description: "deviceMemory is one of the values browsers report",
        category: RuleCategory::Hardware,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: memory_realistic,
    },
    RuleSpec {
        id: "screen_resolution_realistic",
        name: "Realistic resolution",
        description: "Screen resolution is within physical bounds",
        category: RuleCategory::Screen,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: screen_resolution_realistic,
    },
    RuleSpec {
        id: "pixel_ratio_realistic",
        name: "Realistic pixel ratio",
        description: "devicePixelRatio is between 1 and 4",
        category: RuleCategory::Screen,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: pixel_ratio_realistic,
    },
    RuleSpec {
        id: "browser_engine_match",
        name: "Browser / engine match",
        description: "Browser family uses the rendering engine it ships with",
        category: RuleCategory::Browser,
        severity: Severity::Medium,
        kind: RuleKind::Scored,
        check: browser_engine_match,
    },
    RuleSpec {
        id: "browser_version_current",
        name: "Current browser version",
        description: "Browser major version is reasonably recent",
        category: RuleCategory::Browser,
        severity: Severity::Low,
        kind: RuleKind::Informational,
        check: browser_version_current,
    },
    RuleSpec {
        id: "webgl_extensions_count",
        name: "WebGL extension count",
        description: "Number of WebGL extensions is realistic",
        category: RuleCategory::Webgl,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: webgl_extensions_count,
    },
    RuleSpec {
        id: "webgl_max_texture_size",
        name: "WebGL max texture size",
        description: "MAX_TEXTURE_SIZE is realistic",
        category: RuleCategory::Webgl,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: webgl_max_texture_size,
    },
    RuleSpec {
        id: "timezone_language_match",
        name: "Timezone / language match",
        description: "Timezone and primary language point to the same region",
        category: RuleCategory::Network,
        severity: Severity::Low,
        kind: RuleKind::Informational,
        check: timezone_language_match,
    },
    RuleSpec {
        id: "fonts_os_match",
        name: "Fonts / OS match",
        description: "Typical system fonts for the claimed OS are installed",
        category: RuleCategory::Fonts,
        severity: Severity::Medium,
        kind: RuleKind::Informational,
        check: fonts_os_match,
    },
    RuleSpec {
        id: "webdriver_flag",
        name: "WebDriver flag",
        description: "navigator.webdriver is not set",
        category: RuleCategory::Automation,
        severity: Severity::Critical,
        kind: RuleKind::Scored,
        check: webdriver_flag,
    },
    RuleSpec {
        id: "plugins_empty",
        name: "Empty plugin list",
        description: "Reports whether any browser plugins are exposed",
        category: RuleCategory::Automation,
        severity: Severity::Low,
        kind: RuleKind::Informational,
        check: plugins_empty,
    },
    RuleSpec {
        id: "canvas_supported",
        name: "Canvas support",
        description: "Canvas 2D is available",
        category: RuleCategory::Canvas,
        severity: Severity::Medium,
        kind: RuleKind::Scored,
        check: canvas_supported,
    },
    RuleSpec {
        id: "canvas_hash_valid",
        name: "Canvas hash validity",
        description: "Canvas text hash was computed",
        category: RuleCategory::Canvas,
        severity: Severity::Medium,
        kind: RuleKind::Scored,
        check: canvas_hash_valid,
    },
    RuleSpec {
        id: "audio_supported",
        name: "AudioContext support",
        description: "AudioContext is available",
        category: RuleCategory::Audio,
        severity: Severity::Low,
        kind: RuleKind::Informational,
        check: audio_supported,
    },
    RuleSpec {
        id: "audio_sample_rate",
        name: "Audio sample rate",
        description: "Sample rate is one of the common hardware rates",
        category: RuleCategory::Audio,
        severity: Severity::Low,
        kind: RuleKind::Informational,
        check: audio_sample_rate,
    },
    RuleSpec {
        id: "storage_available",
        name: "Storage availability",
        description: "localStorage or sessionStorage is available",
        category: RuleCategory::Storage,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: storage_available,
    },
    RuleSpec {
        id: "touch_points_screen",
        name: "Touch / screen match",
        description: "Touch support fits the screen size",
        category: RuleCategory::Hardware,
        severity: Severity::Low,
        kind: RuleKind::Informational,
        check: touch_points_screen,
    },
    RuleSpec {
        id: "webrtc_realistic_ips",
        name: "Realistic WebRTC addresses",
        description: "Local addresses leaked over WebRTC look sane",
        category: RuleCategory::Network,
        severity: Severity::Medium,
        kind: RuleKind::Scored,
        check: webrtc_realistic_ips,
    },
    RuleSpec {
        id: "color_depth_realistic",
        name: "Color depth",
        description: "Color depth is 24, 30 or 32 bits",
        category: RuleCategory::Screen,
        severity: Severity::Low,
        kind: RuleKind::Informational,
        check: color_depth_realistic,
    },
    RuleSpec {
        id: "headless_chrome",
        name: "Headless Chrome traits",
        description: "Chrome User-Agent comes with the window.chrome object",
        category: RuleCategory::Automation,
        severity: Severity::High,
        kind: RuleKind::Scored,
        check: headless_chrome,
    },
    RuleSpec {
        id: "languages_set",
        name: "Languages set",
        description: "navigator.languages is not empty",
        category: RuleCategory::Browser,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: languages_set,
    },
    RuleSpec {
        id: "client_hints_consistency",
        name: "Client Hints consistency",
        description: "User-Agent Client Hints platform agrees with the User-Agent",
        category: RuleCategory::Browser,
        severity: Severity::Medium,
        kind: RuleKind::Scored,
        check: client_hints_consistency,
    },
    RuleSpec {
        id: "gpu_virtualization",
        name: "GPU virtualization",
        description: "GPU renderer does not name a virtual or software device",
        category: RuleCategory::Virtualization,
        severity: Severity::High,
        kind: RuleKind::Scored,
        check: gpu_virtualization,
    },
    RuleSpec {
        id: "battery_level",
        name: "Battery level",
        description: "Battery level is a fraction between 0 and 1",
        category: RuleCategory::Hardware,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: battery_level,
    },
    RuleSpec {
        id: "cookie_enabled_match",
        name: "Cookies / storage match",
        description: "cookieEnabled agrees with localStorage availability",
        category: RuleCategory::Storage,
        severity: Severity::Low,
        kind: RuleKind::Scored,
        check: cookie_enabled_match,
    },
    RuleSpec {
        id: "do_not_track_header",
        name: "Do Not Track",
        description: "Reports the Do Not Track preference",
        category: RuleCategory::Privacy,
        severity: Severity::Low,
        kind: RuleKind::Informational,
        check: do_not_track_header,
    },
    RuleSpec {
        id: "media_devices_consistency",
        name: "Media device counts",
        description: "Number of cameras, microphones and speakers is plausible",
        category: RuleCategory::Hardware,
        severity: Severity::Low,
        kind: RuleKind::Informational,
        check: media_devices_consistency,
    },
];

/// Which operating system a User-Agent or platform string claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OsClaims {
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
    pub android: bool,
    pub ios: bool,
}

impl OsClaims {
    pub(crate) fn from_ua(ua: &str) -> Self {
        Self {
            windows: ua.contains("windows"),
            mac: ua.contains("mac") && !ua.contains("mobile"),
            linux: ua.contains("linux") && !ua.contains("android"),
            android: ua.contains("android"),
            ios: ua.contains("iphone") || ua.contains("ipad"),
        }
    }

    pub(crate) fn from_platform(platform: &str) -> Self {
        Self {
            windows: platform.contains("win"),
            mac: platform.contains("mac"),
            linux: platform.contains("linux"),
            android: false,
            ios: platform.contains("iphone") || platform.contains("ipad"),
        }
    }
}

fn ua_platform_match(b: &SignalBundle) -> Verdict {
    let ua = OsClaims::from_ua(&b.ua_lower());
    let platform = OsClaims::from_platform(&b.navigator.platform.to_lowercase());
    let shown = &b.navigator.platform;

    if ua.windows && !platform.windows {
        Verdict::fail(format!("User-Agent claims Windows, but platform is {shown}"))
    } else if ua.mac && !platform.mac {
        Verdict::fail(format!("User-Agent claims macOS, but platform is {shown}"))
    } else if ua.linux && !platform.linux {
        Verdict::fail(format!("User-Agent claims Linux, but platform is {shown}"))
    } else if ua.android && !platform.linux {
        Verdict::fail(format!("User-Agent claims Android, but platform is {shown}"))
    } else if ua.ios && !platform.ios && !platform.mac {
        Verdict::fail(format!("User-Agent claims iOS, but platform is {shown}"))
    } else {
        Verdict::pass("User-Agent and platform agree")
    }
}

fn ua_gpu_match(b: &SignalBundle) -> Verdict {
    let ua = b.ua_lower();
    let renderer = b.webgl.renderer.to_lowercase();
    let apple = ["apple", "m1", "m2", "m3"].iter().any(|k| renderer.contains(k));
    let intel = renderer.contains("intel");
    let amd = renderer.contains("amd") || renderer.contains("radeon");

    // Older Macs shipped with Intel or AMD graphics.
    if ua.contains("mac") && renderer != "unknown" && !apple && !intel && !amd {
        return Verdict::fail(format!(
            "User-Agent claims macOS, but GPU is {}",
            b.webgl.renderer
        ));
    }
    Verdict::pass("GPU fits the operating system")
}

fn ua_screen_mobile(b: &SignalBundle) -> Verdict {
    let ua = b.ua_lower();
    let mobile_ua = ua.contains("mobile") || ua.contains("android") || ua.contains("iphone");
    let small_screen = b.hardware.screen.shorter_side() < 768;
    if mobile_ua && !small_screen && !ua.contains("ipad") {
        return Verdict::fail("Mobile User-Agent with a desktop-sized screen");
    }
    Verdict::pass("Screen size fits the device")
}

fn cpu_cores_realistic(b: &SignalBundle) -> Verdict {
    let cores = b.hardware.cpu_cores;
    if cores == 0 {
        return Verdict::fail("Core count is 0");
    }
    if !COMMON_CORE_COUNTS.contains(&cores) {
        return Verdict::note(format!("Unusual core count: {cores}"));
    }
    Verdict::pass(format!("Core count ({cores}) is realistic"))
}

fn memory_realistic(b: &SignalBundle) -> Verdict {
    match b.hardware.memory {
        None => Verdict::pass("Device memory is not exposed"),
        Some(memory) if !DEVICE_MEMORY_BUCKETS.contains(&memory) => {
            Verdict::fail(format!("Unusual device memory: {memory} GB"))
        }
        Some(memory) => Verdict::pass(format!("Device memory ({memory} GB) is realistic")),
    }
}

fn screen_resolution_realistic(b: &SignalBundle) -> Verdict {
    let s = &b.hardware.screen;
    let (w, h) = (s.width, s.height);
    if w == 0 || h == 0 {
        return Verdict::fail("Screen resolution is zero");
    }
    if w < 320 || h < 240 {
        return Verdict::fail(format!("Very small resolution: {w}x{h}"));
    }
    if w > 7680 || h > 4320 {
        return Verdict::note(format!("Very large resolution: {w}x{h}"));
    }
    Verdict::pass(format!("Resolution {w}x{h} is realistic"))
}

fn pixel_ratio_realistic(b: &SignalBundle) -> Verdict {
    let ratio = b.hardware.screen.pixel_ratio;
    if !(1.0..=4.0).contains(&ratio) {
        return Verdict::fail(format!("Unusual pixel ratio: {ratio}"));
    }
    Verdict::pass(format!("Pixel ratio {ratio} is realistic"))
}

fn browser_engine_match(b: &SignalBundle) -> Verdict {
    let browser = b.parsed_ua.browser.name.to_lowercase();
    let engine = b.parsed_ua.engine.name.to_lowercase();
    let expected = if BLINK_BROWSERS.contains(&browser.as_str()) {
        Some("blink")
    } else if browser == "firefox" {
        Some("gecko")
    } else if browser == "safari" {
        Some("webkit")
    } else {
        None
    };
    match expected {
        Some(want) if engine != want => Verdict::fail(format!(
            "{browser} should use {want}, but reports {engine}"
        )),
        _ => Verdict::pass("Browser and engine agree"),
    }
}

fn browser_version_current(b: &SignalBundle) -> Verdict {
    let browser = &b.parsed_ua.browser;
    let outdated = MIN_EXPECTED_MAJOR
        .iter()
        .find(|(name, _)| *name == browser.name)
        .is_some_and(|(_, expected)| browser.major < expected.saturating_sub(30));
    if outdated {
        return Verdict::note(format!(
            "Outdated {} version: {}",
            browser.name, browser.major
        ));
    }
    Verdict::pass(format!("{} {} is current", browser.name, browser.major))
}

fn webgl_extensions_count(b: &SignalBundle) -> Verdict {
    let count = b.webgl.extensions.len();
    match count {
        0 => Verdict::fail("No WebGL extensions exposed"),
        1..=9 => Verdict::note(format!(
            "Few WebGL extensions ({count}), possibly a mobile device"
        )),
        151.. => Verdict::note(format!("Many WebGL extensions ({count})")),
        _ => Verdict::pass(format!("{count} WebGL extensions")),
    }
}

fn webgl_max_texture_size(b: &SignalBundle) -> Verdict {
    let size = b.webgl.max_texture_size;
    if size < 1024 {
        return Verdict::fail(format!("Very small max texture size: {size}"));
    }
    if size > 32_768 {
        return Verdict::note(format!("Very large max texture size: {size}"));
    }
    Verdict::pass(format!("Max texture size: {size}"))
}

fn timezone_language_match(b: &SignalBundle) -> Verdict {
    let tz = &b.misc.timezone;
    let lang = &b.navigator.language;
    let mismatch = TIMEZONE_LANGUAGES
        .iter()
        .find(|(zone, _)| zone == tz)
        .is_some_and(|(_, prefixes)| !prefixes.iter().any(|p| lang.starts_with(p)));
    if mismatch {
        return Verdict::note(format!("Timezone {tz} does not match language {lang}"));
    }
    Verdict::pass("Timezone and language agree")
}

fn fonts_os_match(b: &SignalBundle) -> Verdict {
    let ua = b.ua_lower();
    let fonts: Vec<String> = b.fonts.available.iter().map(|f| f.to_lowercase()).collect();

    if ua.contains("windows") && !WINDOWS_FONTS.iter().any(|f| fonts.iter().any(|x| x == f)) {
        return Verdict::note("Typical Windows fonts not found");
    }
    if ua.contains("mac") && !MAC_FONTS.iter().any(|f| fonts.iter().any(|x| x.contains(f))) {
        return Verdict::note("Typical macOS fonts not found");
    }
    Verdict::pass("System fonts present")
}

fn webdriver_flag(b: &SignalBundle) -> Verdict {
    if b.navigator.webdriver {
        return Verdict::fail("navigator.webdriver is set, a sign of automation");
    }
    Verdict::pass("navigator.webdriver is not set")
}

fn plugins_empty(b: &SignalBundle) -> Verdict {
    let count = b.misc.plugins.len();
    if count == 0 {
        return Verdict::note("No plugins (normal for modern browsers)");
    }
    Verdict::pass(format!("{count} plugins"))
}

fn canvas_supported(b: &SignalBundle) -> Verdict {
    if !b.canvas.supported {
        return Verdict::fail("Canvas is not supported");
    }
    Verdict::pass("Canvas is supported")
}

fn canvas_hash_valid(b: &SignalBundle) -> Verdict {
    if matches!(b.canvas.text_hash.as_str(), "error" | "not_supported") {
        return Verdict::fail("Canvas hash could not be computed");
    }
    Verdict::pass("Canvas hash computed")
}

fn audio_supported(b: &SignalBundle) -> Verdict {
    if !b.audio.supported {
        return Verdict::note("AudioContext is not supported");
    }
    Verdict::pass("AudioContext is supported")
}

fn audio_sample_rate(b: &SignalBundle) -> Verdict {
    let rate = b.audio.sample_rate;
    if rate == 0 {
        return Verdict::pass("Sample rate unknown");
    }
    if !COMMON_SAMPLE_RATES.contains(&rate) {
        return Verdict::note(format!("Unusual sample rate: {rate} Hz"));
    }
    Verdict::pass(format!("Sample rate: {rate} Hz"))
}

fn storage_available(b: &SignalBundle) -> Verdict {
    if !b.storage.local_storage && !b.storage.session_storage {
        return Verdict::fail("Storage APIs are unavailable");
    }
    Verdict::pass("Storage APIs are available")
}

fn touch_points_screen(b: &SignalBundle) -> Verdict {
    let touch = b.hardware.max_touch_points;
    if touch > 0 && b.hardware.screen.shorter_side() >= 1024 {
        return Verdict::note("Touch screen on a large display (tablet or touch laptop)");
    }
    Verdict::pass(format!("Touch points: {touch}"))
}

fn webrtc_realistic_ips(b: &SignalBundle) -> Verdict {
    let ips = &b.webrtc.local_ips;
    if ips.len() > 10 {
        return Verdict::fail(format!("Too many local addresses: {}", ips.len()));
    }
    if ips.iter().any(|ip| ip.starts_with("0.")) {
        return Verdict::fail("Suspicious local addresses found");
    }
    Verdict::pass(format!("{} local addresses", ips.len()))
}

fn color_depth_realistic(b: &SignalBundle) -> Verdict {
    let depth = b.hardware.screen.color_depth;
    if !matches!(depth, 24 | 30 | 32) {
        return Verdict::note(format!("Unusual color depth: {depth}"));
    }
    Verdict::pass(format!("Color depth: {depth}-bit"))
}

fn headless_chrome(b: &SignalBundle) -> Verdict {
    if b.ua_lower().contains("chrome") && !b.navigator.has_window_chrome {
        return Verdict::fail("Chrome User-Agent without window.chrome, a headless trait");
    }
    Verdict::pass("No headless traits found")
}

fn languages_set(b: &SignalBundle) -> Verdict {
    let count = b.navigator.languages.len();
    if count == 0 {
        return Verdict::fail("No languages set");
    }
    Verdict::pass(format!("{count} languages"))
}

fn client_hints_consistency(b: &SignalBundle) -> Verdict {
    let Some(hints) = &b.navigator.user_agent_data else {
        return Verdict::pass("Client Hints not supported");
    };
    let hinted = hints.platform.to_lowercase();
    let ua = b.ua_lower();
    let disagrees = ["windows", "mac", "linux"]
        .iter()
        .any(|os| hinted.contains(os) && !ua.contains(os));
    if disagrees {
        return Verdict::fail("Client Hints platform does not match the User-Agent");
    }
    Verdict::pass("Client Hints agree with the User-Agent")
}

fn gpu_virtualization(b: &SignalBundle) -> Verdict {
    let renderer = b.webgl.renderer.to_lowercase();
    match VM_RENDERER_KEYWORDS.iter().find(|k| renderer.contains(*k)) {
        Some(keyword) => Verdict::fail(format!("GPU points to virtualization: {keyword}")),
        None => Verdict::pass("No GPU virtualization traits found"),
    }
}

fn battery_level(b: &SignalBundle) -> Verdict {
    if !b.battery.supported {
        return Verdict::pass("Battery API not supported");
    }
    let level = b.battery.level;
    if !(0.0..=1.0).contains(&level) {
        return Verdict::fail(format!("Invalid battery level: {level}"));
    }
    Verdict::pass(format!("Battery: {}%", (level * 100.0).round()))
}

fn cookie_enabled_match(b: &SignalBundle) -> Verdict {
    if b.navigator.cookie_enabled && !b.storage.local_storage {
        return Verdict::fail("Cookies enabled, but localStorage is unavailable");
    }
    Verdict::pass("Cookies and storage agree")
}

fn do_not_track_header(b: &SignalBundle) -> Verdict {
    match b.navigator.do_not_track.as_deref() {
        Some("1") => Verdict::note("Do Not Track is enabled"),
        Some(value) if !value.is_empty() => Verdict::pass(format!("DNT: {value}")),
        _ => Verdict::pass("DNT: not set"),
    }
}

fn media_devices_consistency(b: &SignalBundle) -> Verdict {
    let m = &b.media_devices;
    if m.cameras > 5 || m.microphones > 10 || m.speakers > 10 {
        return Verdict::note("Unusually many media devices");
    }
    Verdict::pass(format!(
        "Media: {} cameras, {} microphones",
        m.cameras, m.microphones
    ))
}

pub fn analyze_consistency(bundle: &SignalBundle) -> ConsistencyAnalysis {
    let rules: Vec<_> = RULES.iter().map(|spec| spec.evaluate(bundle)).collect();
    let passed_rules = rules.iter().filter(|r| r.passed).count();
    let critical_issues = rules
        .iter()
        .filter(|r| !r.passed && r.severity == Severity::Critical)
        .cloned()
        .collect();
    let overall_score = consistency_score(&rules);

    tracing::debug!(
        passed = passed_rules,
        total = rules.len(),
        overall_score,
        "consistency scored"
    );

    ConsistencyAnalysis {
        overall_score,
        passed_rules,
        total_rules: rules.len(),
        rules,
        critical_issues,
    }
}

pub fn interpret_consistency_score(score: u8) -> ScoreBand {
    let (level, description, risk_level) = match score {
        90.. => (
            "Excellent consistency",
            "All device parameters are logical and agree with each other. The browser looks genuine.",
            RiskBand::None,
        ),
        75..=89 => (
            "Good consistency",
            "Most parameters agree. Small mismatches can come from browser quirks.",
            RiskBand::Low,
        ),
        50..=74 => (
            "Fair consistency",
            "Some parameters contradict each other. This can point to a modified browser or a VPN.",
            RiskBand::Medium,
        ),
        _ => (
            "Poor consistency",
            "Serious contradictions found. This can point to virtualization, emulation or anti-fingerprinting tools.",
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
    use crate::detectors::rule_penalty;

    fn rule<'a>(analysis: &'a ConsistencyAnalysis, id: &str) -> &'a crate::core::types::ConsistencyRule {
        analysis.rules.iter().find(|r| r.id == id).unwrap()
    }

    #[test]
    fn catalog_has_unique_ids() {
        assert_eq!(RULES.len(), 31);
        let ids: HashSet<_> = RULES.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), RULES.len());
    }

    #[test]
    fn clean_bundle_passes_everything() {
        let analysis = analyze_consistency(&windows_chrome());
        let failed: Vec<_> = analysis.failed().map(|r| r.id.as_str()).collect();
        assert!(failed.is_empty(), "unexpected failures: {failed:?}");
        assert_eq!(analysis.overall_score, 100);
        assert_eq!(analysis.passed_rules, analysis.total_rules);
        assert!(analysis.critical_issues.is_empty());
    }

    #[test]
    fn webdriver_is_a_critical_failure() {
        let mut bundle = windows_chrome();
        bundle.navigator.webdriver = true;
        let analysis = analyze_consistency(&bundle);
        let r = rule(&analysis, "webdriver_flag");
        assert!(!r.passed);
        assert_eq!(r.severity, Severity::Critical);
        assert!(analysis.overall_score <= 80);
        assert_eq!(analysis.critical_issues.len(), 1);
    }

    #[test]
    fn windows_ua_on_mac_platform_fails() {
        let mut bundle = windows_chrome();
        bundle.navigator.platform = "MacIntel".into();
        let analysis = analyze_consistency(&bundle);
        let r = rule(&analysis, "ua_platform_match");
        assert!(!r.passed);
        assert!(r.message.contains("MacIntel"));
        assert_eq!(analysis.overall_score, 90);
    }

    #[test]
    fn mac_with_discrete_nvidia_gpu_fails() {
        let mut bundle = windows_chrome();
        bundle.navigator.user_agent =
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Chrome/124.0.0.0 Safari/537.36".into();
        bundle.navigator.platform = "MacIntel".into();
        let analysis = analyze_consistency(&bundle);
        assert!(!rule(&analysis, "ua_gpu_match").passed);
        // MacIntel on a Mac UA is fine
        assert!(rule(&analysis, "ua_platform_match").passed);
    }

    #[test]
    fn virtual_gpu_fails_virtualization_rule() {
        let mut bundle = windows_chrome();
        bundle.webgl.renderer = "ANGLE (VMware SVGA 3D)".into();
        let analysis = analyze_consistency(&bundle);
        let r = rule(&analysis, "gpu_virtualization");
        assert!(!r.passed);
        assert!(r.message.contains("vmware"));
    }

    #[test]
    fn informational_rules_flag_without_scoring() {
        let mut bundle = windows_chrome();
        bundle.parsed_ua.browser.major = 60;
        bundle.fonts.available = vec!["Comic Neue".into()];
        bundle.audio.sample_rate = 11_025;
        bundle.navigator.do_not_track = Some("1".into());
        bundle.misc.timezone = "Asia/Tokyo".into();
        let analysis = analyze_consistency(&bundle);
        for id in [
            "browser_version_current",
            "fonts_os_match",
            "audio_sample_rate",
            "do_not_track_header",
            "timezone_language_match",
        ] {
            let r = rule(&analysis, id);
            assert!(r.passed, "{id} should pass");
            assert!(r.advisory, "{id} should be advisory");
            assert_eq!(r.kind, RuleKind::Informational);
        }
        assert_eq!(analysis.overall_score, 100);
    }

    #[test]
    fn memory_outside_buckets_fails() {
        let mut bundle = windows_chrome();
        bundle.hardware.memory = Some(16.0);
        assert!(!rule(&analyze_consistency(&bundle), "memory_realistic").passed);
        bundle.hardware.memory = None;
        assert!(rule(&analyze_consistency(&bundle), "memory_realistic").passed);
    }

    #[test]
    fn headless_chrome_without_window_chrome() {
        let mut bundle = windows_chrome();
        bundle.navigator.has_window_chrome = false;
        bundle.navigator.languages.clear();
        let analysis = analyze_consistency(&bundle);
        assert!(!rule(&analysis, "headless_chrome").passed);
        assert!(!rule(&analysis, "languages_set").passed);
        assert_eq!(analysis.overall_score, 88);
    }

    #[test]
    fn client_hints_platform_must_match() {
        let mut bundle = windows_chrome();
        if let Some(hints) = bundle.navigator.user_agent_data.as_mut() {
            hints.platform = "Linux".into();
        }
        assert!(!rule(&analyze_consistency(&bundle), "client_hints_consistency").passed);
        bundle.navigator.user_agent_data = None;
        assert!(rule(&analyze_consistency(&bundle), "client_hints_consistency").passed);
    }

    #[test]
    fn webrtc_addresses_are_sanity_checked() {
        let mut bundle = windows_chrome();
        bundle.webrtc.local_ips = vec!["0.0.0.0".into()];
        assert!(!rule(&analyze_consistency(&bundle), "webrtc_realistic_ips").passed);
        bundle.webrtc.local_ips = (0..11).map(|i| format!("10.0.0.{i}")).collect();
        assert!(!rule(&analyze_consistency(&bundle), "webrtc_realistic_ips").passed);
    }

    #[test]
    fn each_failure_costs_at_most_its_penalty() {
        let mut degraded = windows_chrome();
        degraded.navigator.webdriver = true;
        degraded.hardware.screen.pixel_ratio = 0.5;
        for bundle in [windows_chrome(), degraded] {
            let rules = analyze_consistency(&bundle).rules;
            let before = consistency_score(&rules);
            for (idx, spec) in RULES.iter().enumerate() {
                if !rules[idx].passed {
                    continue;
                }
                let mut flipped = rules.clone();
                flipped[idx].passed = false;
                let after = consistency_score(&flipped);
                assert!(after <= before, "{} raised the score", spec.id);
                assert!(
                    u32::from(before - after) <= rule_penalty(spec.severity),
                    "{} cost {} points",
                    spec.id,
                    before - after
                );
            }
        }
    }

    #[test]
    fn single_failure_costs_exactly_its_penalty() {
        let mut bundle = windows_chrome();
        bundle.navigator.webdriver = true;
        let analysis = analyze_consistency(&bundle);
        let failed: Vec<_> = analysis.failed().map(|r| r.id.as_str()).collect();
        assert_eq!(failed, vec!["webdriver_flag"]);
        assert_eq!(
            u32::from(100 - analysis.overall_score),
            rule_penalty(Severity::Critical)
        );
    }

    #[test]
    fn huge_major_version_is_not_outdated() {
        let mut bundle = windows_chrome();
        bundle.parsed_ua.browser.major = u32::MAX;
        let version = rule(&analyze_consistency(&bundle), "browser_version_current").clone();
        assert!(version.passed);
        assert!(!version.advisory);
        bundle.parsed_ua.browser.major = 1;
        assert!(rule(&analyze_consistency(&bundle), "browser_version_current").advisory);
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(interpret_consistency_score(90).risk_level, RiskBand::None);
        assert_eq!(interpret_consistency_score(75).risk_level, RiskBand::Low);
        assert_eq!(interpret_consistency_score(74).risk_level, RiskBand::Medium);
        assert_eq!(interpret_consistency_score(49).risk_level, RiskBand::High);
    }
}
