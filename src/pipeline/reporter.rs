use std::path::Path;

use anyhow::Result;

use crate::config::{AppConfig, PrivacyConfig};
use crate::core::bundle::SignalBundle;
use crate::core::error::ScanError;
use crate::core::hash::{catalog_hash, rule_catalog};
use crate::core::output::{render_json, render_jsonl, write_document};
use crate::core::time::now_utc;
use crate::core::types::{AnalysisResult, ExportReport, Manifest, ReplaySummary};
use crate::detectors::anomaly::interpret_anomaly_score;
use crate::detectors::consistency::interpret_consistency_score;
use crate::pipeline::aggregator::risk_level_description;
use crate::pipeline::narrator::format_signal_name;
use crate::pipeline::uniqueness::interpret_uniqueness_score;

pub const REDACTED: &str = "[redacted]";

/// Copy of `bundle` with the configured privacy filters applied.
///
/// Analysis always runs on the unfiltered bundle; only exported copies are filtered.
pub fn redact_bundle(
    bundle: &SignalBundle,
    privacy: &PrivacyConfig,
) -> Result<SignalBundle, ScanError> {
    let mut out = bundle.clone();
    if privacy.strip_raw_canvas {
        out.canvas.raw_data_url.clear();
    }
    let patterns = privacy.compiled_patterns()?;
    if patterns.is_empty() {
        return Ok(out);
    }
    let mask = |value: &mut String| {
        if patterns.iter().any(|re| re.is_match(value)) {
            *value = REDACTED.to_string();
        }
    };
    for ip in out.webrtc.local_ips.iter_mut() {
        mask(ip);
    }
    if let Some(ip) = out.webrtc.public_ip.as_mut() {
        mask(ip);
    }
    for label in out.media_devices.device_labels.iter_mut() {
        mask(label);
    }
    Ok(out)
}

pub fn build_export(
    bundle: &SignalBundle,
    analysis: &AnalysisResult,
    cfg: &AppConfig,
) -> Result<ExportReport, ScanError> {
    Ok(ExportReport {
        version: cfg.export.version.clone(),
        generated_at: now_utc(),
        fingerprint: redact_bundle(bundle, &cfg.privacy)?,
        analysis: analysis.clone(),
        disclaimer: cfg.export.disclaimer.clone(),
    })
}

pub fn write_export_json(report: &ExportReport, path: &Path, pretty: bool) -> Result<()> {
    let json = render_json(report, pretty)?;
    write_document(path, &json)?;
    Ok(())
}

pub fn write_markdown_report(report: &ExportReport, path: &Path) -> Result<()> {
    write_document(path, &render_markdown(report))?;
    Ok(())
}

pub fn render_markdown(report: &ExportReport) -> String {
    let analysis = &report.analysis;
    let ua = &report.fingerprint.parsed_ua;
    let mut out = String::new();
    out.push_str("# printscope Fingerprint Report\n\n");
    out.push_str(&format!("- Generated: {}\n", report.generated_at.to_rfc3339()));
    out.push_str(&format!(
        "- Browser: {} {} on {} {}\n",
        ua.browser.name, ua.browser.version, ua.os.name, ua.os.version
    ));
    out.push_str(&format!("- Overall score: {}\n", analysis.overall_score));
    out.push_str(&format!(
        "- Privacy risk: {} ({})\n",
        analysis.privacy_risk_level,
        risk_level_description(analysis.privacy_risk_level)
    ));
    out.push_str(&format!("- Trackability: {}\n\n", analysis.trackability_level));

    out.push_str("## Summary\n");
    out.push_str(&format!("{}\n\n", analysis.ai_report.summary));

    let u = interpret_uniqueness_score(analysis.uniqueness.overall_score);
    out.push_str(&format!(
        "## Uniqueness: {} ({})\n",
        analysis.uniqueness.overall_score, u.level
    ));
    out.push_str(&format!(
        "- Entropy: {:.1} bits\n",
        analysis.uniqueness.bits_of_entropy
    ));
    for signal in &analysis.uniqueness.rarest_signals {
        out.push_str(&format!(
            "- Rare: {} (rarity {})\n",
            format_signal_name(&signal.signal),
            signal.rarity
        ));
    }
    out.push('\n');

    let c = interpret_consistency_score(analysis.consistency.overall_score);
    out.push_str(&format!(
        "## Consistency: {} ({})\n",
        analysis.consistency.overall_score, c.level
    ));
    out.push_str(&format!(
        "- Passed: {}/{}\n",
        analysis.consistency.passed_rules, analysis.consistency.total_rules
    ));
    for rule in analysis.consistency.failed() {
        out.push_str(&format!(
            "- [{}] {}: {}\n",
            rule.severity, rule.name, rule.message
        ));
    }
    for rule in analysis.consistency.rules.iter().filter(|r| r.advisory) {
        out.push_str(&format!("- [note] {}: {}\n", rule.name, rule.message));
    }
    out.push('\n');

    let a = interpret_anomaly_score(analysis.anomaly.overall_score);
    out.push_str(&format!(
        "## Anomalies: {} ({})\n",
        analysis.anomaly.overall_score, a.level
    ));
    if analysis.anomaly.detected_anomalies.is_empty() {
        out.push_str("No anomalies detected.\n");
    }
    for indicator in &analysis.anomaly.detected_anomalies {
        out.push_str(&format!(
            "- [{}] {}: {}\n",
            indicator.severity,
            indicator.name,
            indicator.evidence.join("; ")
        ));
    }
    out.push('\n');

    out.push_str("## Recommendations\n");
    for line in &analysis.ai_report.recommendations {
        out.push_str(&format!("- {}\n", line));
    }
    out.push('\n');
    out.push_str("## Privacy Tips\n");
    for line in &analysis.ai_report.privacy_tips {
        out.push_str(&format!("- {}\n", line));
    }
    out.push('\n');
    out.push_str(&format!("_{}_\n", report.disclaimer));
    out
}

pub fn summarize(line: usize, bundle_hash: String, analysis: &AnalysisResult) -> ReplaySummary {
    ReplaySummary {
        line,
        bundle_hash,
        overall_score: analysis.overall_score,
        uniqueness: analysis.uniqueness.overall_score,
        consistency: analysis.consistency.overall_score,
        anomaly: analysis.anomaly.overall_score,
        privacy_risk_level: analysis.privacy_risk_level,
        trackability_level: analysis.trackability_level,
        failed_rules: analysis.consistency.failed().map(|r| r.id.clone()).collect(),
        detected_anomalies: analysis
            .anomaly
            .detected_anomalies
            .iter()
            .map(|i| i.id.clone())
            .collect(),
    }
}

pub fn write_summary_jsonl(summaries: &[ReplaySummary], path: &Path) -> Result<()> {
    let lines = render_jsonl(summaries)?;
    write_document(path, &lines)?;
    Ok(())
}

pub fn build_manifest(version: &str, bundle_hash: String, export_hash: String) -> Manifest {
    Manifest {
        version: version.to_string(),
        generated_at: now_utc(),
        bundle_hash,
        export_hash,
        catalog_hash: catalog_hash(),
        rule_catalog: rule_catalog(),
    }
}

pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<()> {
    let json = render_json(manifest, true)?;
    write_document(path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use crate::core::bundle::fixtures::windows_chrome;
    use crate::pipeline::aggregator::analyze_fingerprint;

    #[test]
    fn redaction_only_touches_the_copy() {
        let bundle = windows_chrome();
        let privacy = PrivacyConfig {
            strip_raw_canvas: true,
            redact_patterns: vec![r"^192\.168\.".to_string()],
        };
        let redacted = redact_bundle(&bundle, &privacy).unwrap();
        assert_eq!(redacted.webrtc.local_ips, vec![REDACTED.to_string()]);
        assert!(redacted.canvas.raw_data_url.is_empty());
        assert_eq!(bundle.webrtc.local_ips, vec!["192.168.1.23".to_string()]);
        assert!(!bundle.canvas.raw_data_url.is_empty());
    }

    #[test]
    fn default_privacy_keeps_bundle_intact() {
        let bundle = windows_chrome();
        let redacted = redact_bundle(&bundle, &PrivacyConfig::default()).unwrap();
        assert_eq!(redacted, bundle);
    }

    #[test]
    fn markdown_lists_every_section() {
        let bundle = windows_chrome();
        let analysis = analyze_fingerprint(&bundle);
        let export = build_export(&bundle, &analysis, &default_config()).unwrap();
        let md = render_markdown(&export);
        for heading in [
            "# printscope Fingerprint Report",
            "## Summary",
            "## Uniqueness:",
            "## Consistency: 100",
            "## Anomalies: 100",
            "No anomalies detected.",
            "## Recommendations",
            "## Privacy Tips",
        ] {
            assert!(md.contains(heading), "missing {heading}");
        }
        assert!(md.contains("- Passed: 31/31"));
    }

    #[test]
    fn summary_lists_failures_by_id() {
        let mut bundle = windows_chrome();
        bundle.navigator.webdriver = true;
        let analysis = analyze_fingerprint(&bundle);
        let summary = summarize(3, "abc".into(), &analysis);
        assert_eq!(summary.line, 3);
        assert!(summary.failed_rules.contains(&"webdriver_flag".to_string()));
        assert!(summary
            .detected_anomalies
            .contains(&"automation_webdriver".to_string()));
    }

    #[test]
    fn manifest_carries_the_catalog() {
        let manifest = build_manifest("1.0.0", "b".into(), "e".into());
        assert_eq!(manifest.rule_catalog.len(), 31 + 19);
        assert_eq!(manifest.catalog_hash, catalog_hash());
    }
}
