use crate::core::bundle::SignalBundle;
use crate::core::types::{AnalysisResult, Level};
use crate::detectors::anomaly::analyze_anomalies;
use crate::detectors::consistency::analyze_consistency;
use crate::pipeline::narrator::build_report;
use crate::pipeline::uniqueness::analyze_uniqueness;

pub const UNIQUENESS_WEIGHT: f64 = 0.40;
pub const CONSISTENCY_WEIGHT: f64 = 0.35;
pub const ANOMALY_WEIGHT: f64 = 0.25;

/// Run all three analyzers and merge them into one report.
pub fn analyze_fingerprint(bundle: &SignalBundle) -> AnalysisResult {
    let uniqueness = analyze_uniqueness(bundle);
    let consistency = analyze_consistency(bundle);
    let anomaly = analyze_anomalies(bundle);

    let (u, c, a) = (
        uniqueness.overall_score,
        consistency.overall_score,
        anomaly.overall_score,
    );
    let overall_score = weighted_score(u, c, a);
    let privacy_risk_level = privacy_risk_level(u, c, a);
    let trackability_level = trackability_level(u);
    let ai_report = build_report(bundle, &uniqueness, &consistency, &anomaly);

    tracing::info!(
        overall_score,
        uniqueness = u,
        consistency = c,
        anomaly = a,
        privacy_risk = %privacy_risk_level,
        "fingerprint analysed"
    );

    AnalysisResult {
        uniqueness,
        consistency,
        anomaly,
        overall_score,
        privacy_risk_level,
        trackability_level,
        ai_report,
    }
}

pub fn weighted_score(uniqueness: u8, consistency: u8, anomaly: u8) -> u8 {
    let blended = f64::from(uniqueness) * UNIQUENESS_WEIGHT
        + f64::from(consistency) * CONSISTENCY_WEIGHT
        + f64::from(anomaly) * ANOMALY_WEIGHT;
    blended.round().clamp(0.0, 100.0) as u8
}

/// First matching branch wins. The branches overlap, so the result can jump
/// between neighbouring scores; the ordering below is the contract.
pub fn privacy_risk_level(uniqueness: u8, consistency: u8, anomaly: u8) -> Level {
    if uniqueness >= 80 && consistency >= 80 {
        Level::VeryHigh
    } else if uniqueness >= 60 && consistency >= 70 {
        Level::High
    } else if uniqueness < 40 || anomaly < 60 {
        Level::Low
    } else if uniqueness < 25 {
        Level::VeryLow
    } else {
        Level::Medium
    }
}

pub fn trackability_level(uniqueness: u8) -> Level {
    match uniqueness {
        85.. => Level::VeryHigh,
        70..=84 => Level::High,
        50..=69 => Level::Medium,
        30..=49 => Level::Low,
        _ => Level::VeryLow,
    }
}

pub fn risk_level_description(level: Level) -> &'static str {
    match level {
        Level::VeryLow => "Very low risk: your device is practically impossible to track",
        Level::Low => "Low risk: tracking is difficult",
        Level::Medium => "Medium risk: partial tracking is possible",
        Level::High => "High risk: you are easy to identify",
        Level::VeryHigh => "Very high risk: your device is unique and easy to track",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bundle::fixtures::windows_chrome;

    #[test]
    fn weights_sum_to_one() {
        assert!((UNIQUENESS_WEIGHT + CONSISTENCY_WEIGHT + ANOMALY_WEIGHT - 1.0).abs() < 1e-9);
        assert_eq!(weighted_score(100, 100, 100), 100);
        assert_eq!(weighted_score(0, 0, 0), 0);
        assert_eq!(weighted_score(50, 100, 100), 80);
    }

    #[test]
    fn privacy_ladder_first_match_wins() {
        assert_eq!(privacy_risk_level(85, 85, 0), Level::VeryHigh);
        assert_eq!(privacy_risk_level(60, 75, 100), Level::High);
        assert_eq!(privacy_risk_level(59, 75, 100), Level::Medium);
        assert_eq!(privacy_risk_level(39, 75, 100), Level::Low);
        assert_eq!(privacy_risk_level(50, 50, 59), Level::Low);
        // unreachable in practice: uniqueness < 25 is already caught by < 40
        assert_eq!(privacy_risk_level(10, 10, 100), Level::Low);
    }

    #[test]
    fn trackability_bands() {
        assert_eq!(trackability_level(85), Level::VeryHigh);
        assert_eq!(trackability_level(84), Level::High);
        assert_eq!(trackability_level(50), Level::Medium);
        assert_eq!(trackability_level(30), Level::Low);
        assert_eq!(trackability_level(29), Level::VeryLow);
    }

    #[test]
    fn analysis_is_deterministic() {
        let bundle = windows_chrome();
        let first = analyze_fingerprint(&bundle);
        let second = analyze_fingerprint(&bundle);
        assert_eq!(first, second);
        assert_eq!(
            first.overall_score,
            weighted_score(
                first.uniqueness.overall_score,
                first.consistency.overall_score,
                first.anomaly.overall_score
            )
        );
    }

    #[test]
    fn every_level_has_a_description() {
        for level in [
            Level::VeryLow,
            Level::Low,
            Level::Medium,
            Level::High,
            Level::VeryHigh,
        ] {
            assert!(!risk_level_description(level).is_empty());
        }
    }
}
