//! Declarative consistency rules and anomaly indicators.
//!
//! Both families are plain tables of records holding a pure check function.
//! The runners below evaluate every record against a bundle and fold the
//! outcomes into a bounded score; penalties live in one place per family.

use crate::core::bundle::SignalBundle;
use crate::core::types::{
    AnomalyIndicator, AnomalyType, ConsistencyRule, IndicatorSeverity, RuleCategory, RuleKind,
    Severity,
};

pub mod anomaly;
pub mod consistency;

/// Score deducted for one failed rule of each severity.
pub const RULE_PENALTIES: &[(Severity, u32)] = &[
    (Severity::Low, 2),
    (Severity::Medium, 5),
    (Severity::High, 10),
    (Severity::Critical, 20),
];

/// Score deducted for one detected indicator of each severity.
pub const INDICATOR_PENALTIES: &[(IndicatorSeverity, u32)] = &[
    (IndicatorSeverity::Low, 3),
    (IndicatorSeverity::Medium, 8),
    (IndicatorSeverity::High, 15),
];

pub fn rule_penalty(severity: Severity) -> u32 {
    RULE_PENALTIES
        .iter()
        .find(|(s, _)| *s == severity)
        .map(|(_, p)| *p)
        .unwrap_or(0)
}

pub fn indicator_penalty(severity: IndicatorSeverity) -> u32 {
    INDICATOR_PENALTIES
        .iter()
        .find(|(s, _)| *s == severity)
        .map(|(_, p)| *p)
        .unwrap_or(0)
}

/// Result of one rule check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    /// An informational rule saw something worth mentioning.
    pub notable: bool,
    pub message: String,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            notable: false,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            notable: false,
            message: message.into(),
        }
    }

    /// Passing, but flagged as a deviation worth reporting.
    pub fn note(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            notable: true,
            message: message.into(),
        }
    }
}

/// Result of one indicator probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub evidence: Vec<String>,
}

impl Detection {
    pub fn push(&mut self, line: impl Into<String>) {
        self.evidence.push(line.into());
    }

    pub fn detected(&self) -> bool {
        !self.evidence.is_empty()
    }
}

pub struct RuleSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    pub kind: RuleKind,
    pub check: fn(&SignalBundle) -> Verdict,
}

pub struct IndicatorSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub anomaly_type: AnomalyType,
    pub severity: IndicatorSeverity,
    pub detect: fn(&SignalBundle) -> Detection,
}

impl RuleSpec {
    pub fn evaluate(&self, bundle: &SignalBundle) -> ConsistencyRule {
        let verdict = (self.check)(bundle);
        let (passed, advisory) = match self.kind {
            RuleKind::Scored => (verdict.passed, false),
            RuleKind::Informational => (true, verdict.notable || !verdict.passed),
        };
        if !passed {
            tracing::debug!(rule = self.id, severity = ?self.severity, message = %verdict.message, "rule failed");
        }
        ConsistencyRule {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            category: self.category,
            severity: self.severity,
            kind: self.kind,
            passed,
            advisory,
            message: verdict.message,
        }
    }
}

impl IndicatorSpec {
    pub fn evaluate(&self, bundle: &SignalBundle) -> AnomalyIndicator {
        let detection = (self.detect)(bundle);
        let detected = detection.detected();
        if detected {
            tracing::debug!(indicator = self.id, kind = %self.anomaly_type, evidence = detection.evidence.len(), "indicator detected");
        }
        AnomalyIndicator {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            anomaly_type: self.anomaly_type,
            severity: self.severity,
            detected,
            evidence: detection.evidence,
        }
    }
}

/// 100 minus the penalty of every failed rule, floored at zero.
pub fn consistency_score(rules: &[ConsistencyRule]) -> u8 {
    let penalty: u32 = rules
        .iter()
        .filter(|r| !r.passed)
        .map(|r| rule_penalty(r.severity))
        .sum();
    100u32.saturating_sub(penalty) as u8
}

/// 100 minus the penalty of every detected indicator, floored at zero.
pub fn anomaly_score(indicators: &[AnomalyIndicator]) -> u8 {
    let penalty: u32 = indicators
        .iter()
        .filter(|i| i.detected)
        .map(|i| indicator_penalty(i.severity))
        .sum();
    100u32.saturating_sub(penalty) as u8
}

/// Saturating linear estimate: `count * weight`, never above 0.95.
pub fn probability(count: usize, weight: f64) -> f64 {
    (count as f64 * weight).min(0.95)
}
