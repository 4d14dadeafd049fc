//! Plain-language report text built from the three analyses.

use crate::core::bundle::SignalBundle;
use crate::core::types::{
    AiReport, AnomalyAnalysis, AnomalyType, ConsistencyAnalysis, Severity, UniquenessAnalysis,
};
use crate::detectors::anomaly::interpret_anomaly_score;
use crate::detectors::consistency::interpret_consistency_score;
use crate::pipeline::uniqueness::interpret_uniqueness_score;

pub const MAX_RECOMMENDATIONS: usize = 6;
pub const MAX_PRIVACY_TIPS: usize = 5;

const SIGNAL_LABELS: &[(&str, &str)] = &[
    ("canvas_text", "Canvas text"),
    ("canvas_geometry", "Canvas geometry"),
    ("canvas_gradient", "Canvas gradient"),
    ("webgl_vendor", "WebGL vendor"),
    ("webgl_renderer", "GPU renderer"),
    ("webgl_extensions", "WebGL extensions"),
    ("audio_hash", "Audio fingerprint"),
    ("fonts_count", "Font count"),
    ("screen_resolution", "Screen resolution"),
    ("hardware_concurrency", "CPU cores"),
    ("device_memory", "Device memory"),
    ("pixel_ratio", "Pixel ratio"),
    ("color_depth", "Color depth"),
    ("platform", "Platform"),
    ("language", "Language"),
    ("timezone", "Timezone"),
    ("browser_name", "Browser"),
    ("browser_version", "Browser version"),
    ("max_touch_points", "Touch points"),
    ("webrtc_local_ips", "WebRTC addresses"),
    ("cameras", "Cameras"),
    ("fpjs_visitor_id", "FingerprintJS ID"),
];

/// Human label for a signal id; unknown ids are returned unchanged.
pub fn format_signal_name(signal: &str) -> &str {
    SIGNAL_LABELS
        .iter()
        .find(|(id, _)| *id == signal)
        .map(|(_, label)| *label)
        .unwrap_or(signal)
}

pub fn build_report(
    bundle: &SignalBundle,
    uniqueness: &UniquenessAnalysis,
    consistency: &ConsistencyAnalysis,
    anomaly: &AnomalyAnalysis,
) -> AiReport {
    AiReport {
        summary: summary(bundle, uniqueness, consistency),
        uniqueness_assessment: uniqueness_assessment(uniqueness),
        consistency_assessment: consistency_assessment(consistency),
        anomaly_assessment: anomaly_assessment(anomaly),
        recommendations: recommendations(bundle, uniqueness, consistency, anomaly),
        privacy_tips: privacy_tips(bundle, uniqueness),
    }
}

fn summary(
    bundle: &SignalBundle,
    uniqueness: &UniquenessAnalysis,
    consistency: &ConsistencyAnalysis,
) -> String {
    let ua = &bundle.parsed_ua;
    let verdict = match uniqueness.overall_score {
        80.. => "has a highly unique fingerprint.",
        60..=79 => "has a moderately unique fingerprint.",
        _ => "has a common fingerprint.",
    };
    format!(
        "Your device \"{} {}\" on {} {} Uniqueness: {}%. Parameter consistency: {}%.",
        ua.browser.name,
        ua.browser.version,
        ua.os.name,
        verdict,
        uniqueness.overall_score,
        consistency.overall_score
    )
}

fn uniqueness_assessment(uniqueness: &UniquenessAnalysis) -> String {
    let band = interpret_uniqueness_score(uniqueness.overall_score);
    let mut text = format!("{}. {}", band.level, band.description);
    if let Some(rarest) = uniqueness.rarest_signals.first() {
        text.push_str(&format!(
            " Rarest trait: {} (rarity {}%).",
            format_signal_name(&rarest.signal),
            rarest.rarity
        ));
    }
    if let Some(common) = uniqueness.common_signals.first() {
        text.push_str(&format!(
            " Most common trait: {} (rarity {}%).",
            format_signal_name(&common.signal),
            common.rarity
        ));
    }
    text
}

fn consistency_assessment(consistency: &ConsistencyAnalysis) -> String {
    let band = interpret_consistency_score(consistency.overall_score);
    let mut text = format!("{}. {}", band.level, band.description);
    let failed: Vec<_> = consistency.failed().collect();
    if failed.is_empty() {
        text.push_str(" All parameters are consistent and logical.");
        return text;
    }
    text.push_str(&format!(" Found {} inconsistencies.", failed.len()));
    let serious: Vec<&str> = failed
        .iter()
        .filter(|r| matches!(r.severity, Severity::Critical | Severity::High))
        .map(|r| r.name.as_str())
        .collect();
    if !serious.is_empty() {
        text.push_str(&format!(" Serious: {}.", serious.join(", ")));
    }
    text
}

fn anomaly_assessment(anomaly: &AnomalyAnalysis) -> String {
    let band = interpret_anomaly_score(anomaly.overall_score);
    let mut text = format!("{}. {}", band.level, band.description);
    for (kind, label) in [
        (AnomalyType::Virtualization, "Virtualization traits"),
        (AnomalyType::Automation, "Automation traits"),
        (AnomalyType::Modification, "Modification traits"),
    ] {
        let n = anomaly.count_of(kind);
        if n > 0 {
            text.push_str(&format!(" {label}: {n}."));
        }
    }
    text
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

fn recommendations(
    bundle: &SignalBundle,
    uniqueness: &UniquenessAnalysis,
    consistency: &ConsistencyAnalysis,
    anomaly: &AnomalyAnalysis,
) -> Vec<String> {
    let mut out = Vec::new();
    let score = uniqueness.overall_score;
    if score >= 80 {
        push_unique(&mut out, "Your device is highly unique. Consider a browser with anti-fingerprinting protection.");
        push_unique(&mut out, "Switch to a more common screen configuration (for example 1920x1080).");
    } else if score < 30 {
        push_unique(&mut out, "Your device looks like many others, which is good for privacy.");
        push_unique(&mut out, "If you need a more distinctive profile (for testing), install additional fonts.");
    }

    if !consistency.critical_issues.is_empty() {
        push_unique(&mut out, "Critical inconsistencies in your fingerprint can break some sites. Review your browser settings.");
    }

    if anomaly.virtualization_probability > 0.5 {
        push_unique(&mut out, "Virtualization traits found. This is expected if you are running a VM.");
    }
    if anomaly.automation_probability > 0.5 {
        push_unique(&mut out, "Automation traits found. Some sites may block this browser.");
    }

    match bundle.parsed_ua.browser.name.as_str() {
        "Chrome" => push_unique(&mut out, "Chrome exposes a lot of fingerprint data. Consider Firefox or Brave for better privacy."),
        "Firefox" => push_unique(&mut out, "Firefox has built-in fingerprinting protection. Enable privacy.resistFingerprinting in about:config for maximum protection."),
        "Brave" => push_unique(&mut out, "Brave has strong built-in fingerprinting protection. Your privacy is in good shape."),
        _ => {}
    }

    if !bundle.webrtc.local_ips.is_empty() {
        push_unique(&mut out, "WebRTC leaks local IP addresses. Install a WebRTC-blocking extension or disable WebRTC in browser settings.");
    }
    if bundle.fonts.count > 200 {
        push_unique(&mut out, "A large number of fonts increases uniqueness. Use a standard font set for privacy.");
    }

    out.truncate(MAX_RECOMMENDATIONS);
    out
}

fn privacy_tips(bundle: &SignalBundle, uniqueness: &UniquenessAnalysis) -> Vec<String> {
    let mut tips = Vec::new();
    push_unique(&mut tips, "Keep your browser up to date. New versions often improve protection.");
    push_unique(&mut tips, "Use private browsing for sensitive sessions.");

    if uniqueness.overall_score > 70 {
        push_unique(&mut tips, "Install a fingerprint randomization extension (for example Canvas Defender).");
    }
    if !bundle.webrtc.local_ips.is_empty() {
        push_unique(&mut tips, "Use a VPN with WebRTC leak protection.");
    }

    match bundle.parsed_ua.browser.name.as_str() {
        "Firefox" => {
            push_unique(&mut tips, "Set privacy.resistFingerprinting = true in about:config for maximum protection.");
            push_unique(&mut tips, "Set extensions.pocket.enabled = false to shrink your fingerprint.");
        }
        "Chrome" => {
            push_unique(&mut tips, "Consider switching to Brave or Firefox for better privacy.");
            push_unique(&mut tips, "Install uBlock Origin to block trackers.");
        }
        _ => {}
    }

    push_unique(&mut tips, "Use Tor Browser for anonymous browsing (maximum protection).");
    push_unique(&mut tips, "Consider Firefox containers to isolate sites from each other.");

    tips.truncate(MAX_PRIVACY_TIPS);
    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bundle::fixtures::windows_chrome;
    use crate::detectors::anomaly::analyze_anomalies;
    use crate::detectors::consistency::analyze_consistency;
    use crate::pipeline::uniqueness::analyze_uniqueness;

    fn report_for(bundle: &SignalBundle) -> AiReport {
        build_report(
            bundle,
            &analyze_uniqueness(bundle),
            &analyze_consistency(bundle),
            &analyze_anomalies(bundle),
        )
    }

    #[test]
    fn signal_names_are_humanized() {
        assert_eq!(format_signal_name("webgl_renderer"), "GPU renderer");
        assert_eq!(format_signal_name("unknown_signal"), "unknown_signal");
    }

    #[test]
    fn summary_names_browser_and_scores() {
        let report = report_for(&windows_chrome());
        assert!(report.summary.starts_with("Your device \"Chrome 124.0.0.0\" on Windows"));
        assert!(report.summary.contains("Parameter consistency: 100%."));
        assert!(report
            .consistency_assessment
            .ends_with("All parameters are consistent and logical."));
        assert!(report.uniqueness_assessment.contains("FingerprintJS ID"));
    }

    #[test]
    fn lists_are_bounded_and_unique() {
        let mut bundle = windows_chrome();
        bundle.navigator.webdriver = true;
        bundle.navigator.has_window_chrome = false;
        bundle.navigator.window_globals = vec!["cdc_x".into()];
        bundle.fonts.count = 300;
        let report = report_for(&bundle);
        assert!(report.recommendations.len() <= MAX_RECOMMENDATIONS);
        assert!(report.privacy_tips.len() <= MAX_PRIVACY_TIPS);
        let mut deduped = report.recommendations.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), report.recommendations.len());
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("Automation traits found")));
    }

    #[test]
    fn chrome_tips_recommend_alternatives() {
        let report = report_for(&windows_chrome());
        assert_eq!(report.privacy_tips.len(), MAX_PRIVACY_TIPS);
        assert!(report
            .privacy_tips
            .iter()
            .any(|t| t.contains("VPN with WebRTC leak protection")));
    }

    #[test]
    fn anomaly_assessment_counts_types() {
        let mut bundle = windows_chrome();
        bundle.webgl.renderer = "SwiftShader".into();
        let report = report_for(&bundle);
        assert!(report.anomaly_assessment.contains("Virtualization traits: 1."));
    }
}
