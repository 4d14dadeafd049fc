use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::bundle::SignalBundle;

/// Severity of a consistency rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Severity of an anomaly indicator. Indicators never go above `High`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.pad(label)
    }
}

impl fmt::Display for IndicatorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IndicatorSeverity::Low => "low",
            IndicatorSeverity::Medium => "medium",
            IndicatorSeverity::High => "high",
        };
        f.pad(label)
    }
}

/// Scored rules move the consistency score when they fail; informational
/// rules only ever contribute a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Scored,
    Informational,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    UserAgent,
    Hardware,
    Screen,
    Browser,
    Webgl,
    Network,
    Fonts,
    Automation,
    Canvas,
    Audio,
    Storage,
    Virtualization,
    Privacy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyType {
    Virtualization,
    Emulation,
    Automation,
    Modification,
    Inconsistency,
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnomalyType::Virtualization => "virtualization",
            AnomalyType::Emulation => "emulation",
            AnomalyType::Automation => "automation",
            AnomalyType::Modification => "modification",
            AnomalyType::Inconsistency => "inconsistency",
        };
        f.pad(label)
    }
}

/// Five-step scale shared by privacy risk and trackability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::VeryLow => "very low",
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
            Level::VeryHigh => "very high",
        };
        f.pad(label)
    }
}

/// Four-step risk band used by the consistency and anomaly interpreters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalObservation {
    pub signal: String,
    pub value: serde_json::Value,
    pub entropy: f64,
    pub rarity: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedSignal {
    pub signal: String,
    pub rarity: u8,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UniquenessAnalysis {
    pub overall_score: u8,
    pub entropy: f64,
    pub bits_of_entropy: f64,
    pub rarest_signals: Vec<RankedSignal>,
    pub common_signals: Vec<RankedSignal>,
    pub category_scores: BTreeMap<String, f64>,
}

/// Outcome of one consistency rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub kind: RuleKind,
    pub passed: bool,
    /// Set when an informational rule noticed a deviation it does not score.
    #[serde(default)]
    pub advisory: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyAnalysis {
    pub overall_score: u8,
    pub passed_rules: usize,
    pub total_rules: usize,
    pub rules: Vec<ConsistencyRule>,
    pub critical_issues: Vec<ConsistencyRule>,
}

impl ConsistencyAnalysis {
    pub fn failed(&self) -> impl Iterator<Item = &ConsistencyRule> {
        self.rules.iter().filter(|r| !r.passed)
    }
}

/// Outcome of one anomaly indicator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyIndicator {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub severity: IndicatorSeverity,
    pub detected: bool,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyAnalysis {
    pub overall_score: u8,
    pub detected_anomalies: Vec<AnomalyIndicator>,
    pub virtualization_probability: f64,
    pub automation_probability: f64,
    pub modification_probability: f64,
}

impl AnomalyAnalysis {
    pub fn count_of(&self, anomaly_type: AnomalyType) -> usize {
        self.detected_anomalies
            .iter()
            .filter(|a| a.anomaly_type == anomaly_type)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiReport {
    pub summary: String,
    pub uniqueness_assessment: String,
    pub consistency_assessment: String,
    pub anomaly_assessment: String,
    pub recommendations: Vec<String>,
    pub privacy_tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub uniqueness: UniquenessAnalysis,
    pub consistency: ConsistencyAnalysis,
    pub anomaly: AnomalyAnalysis,
    pub overall_score: u8,
    pub privacy_risk_level: Level,
    pub trackability_level: Level,
    pub ai_report: AiReport,
}

/// Band returned by `interpret_uniqueness_score`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UniquenessBand {
    pub level: String,
    pub description: String,
    pub trackability: Level,
}

/// Band returned by the consistency and anomaly interpreters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBand {
    pub level: String,
    pub description: String,
    pub risk_level: RiskBand,
}

/// Document written by `printscope analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub fingerprint: SignalBundle,
    pub analysis: AnalysisResult,
    pub disclaimer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub bundle_hash: String,
    pub export_hash: String,
    pub catalog_hash: String,
    pub rule_catalog: Vec<String>,
}

/// One line of `printscope replay` output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub line: usize,
    pub bundle_hash: String,
    pub overall_score: u8,
    pub uniqueness: u8,
    pub consistency: u8,
    pub anomaly: u8,
    pub privacy_risk_level: Level,
    pub trackability_level: Level,
    pub failed_rules: Vec<String>,
    pub detected_anomalies: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Markdown,
}
