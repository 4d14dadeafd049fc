use std::fs;

use anyhow::{anyhow, Context, Result};

use crate::cli::config::{ensure_output_dir, resolve_config, resolve_output_file, RunConfig};
use crate::cli::flags::{Axis, Cli, Command, RuleFamily};
use crate::config::load_config;
use crate::core::bundle::SignalBundle;
use crate::core::hash::{hash_file, sha256_hex};
use crate::core::time::date_stamp;
use crate::core::types::{Manifest, OutputFormat, ReplaySummary};
use crate::detectors::anomaly::{interpret_anomaly_score, INDICATORS};
use crate::detectors::consistency::{interpret_consistency_score, RULES};
use crate::pipeline::aggregator::analyze_fingerprint;
use crate::pipeline::reporter::{
    build_export, build_manifest, summarize, write_export_json, write_manifest,
    write_markdown_report, write_summary_jsonl,
};
use crate::pipeline::uniqueness::interpret_uniqueness_score;

/// Below this Jaro-Winkler similarity no suggestion is offered.
const SUGGESTION_THRESHOLD: f64 = 0.75;

pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Analyze { .. } => {
            let cfg = resolve_config(&cli)?;
            run_analyze_with_config(&cfg).map(|_| ())
        }
        Command::Replay { .. } => {
            let cfg = resolve_config(&cli)?;
            run_replay_with_config(&cfg).map(|_| ())
        }
        Command::Rules { kind, id } => run_rules(*kind, id.as_deref()),
        Command::Interpret { axis, score } => run_interpret(*axis, *score),
    }
}

pub fn run_analyze_with_config(cfg: &RunConfig) -> Result<Manifest> {
    let app = load_config(cfg.config_path.as_deref())?;
    let data = fs::read_to_string(&cfg.input)
        .with_context(|| format!("reading bundle {}", cfg.input.display()))?;
    let bundle = SignalBundle::from_json(&data)
        .with_context(|| format!("parsing bundle {}", cfg.input.display()))?;
    let bundle_hash = sha256_hex(data.as_bytes());

    let analysis = analyze_fingerprint(&bundle);
    let export = build_export(&bundle, &analysis, &app)?;

    let default_name = format!("printscope-report-{}", date_stamp(export.generated_at));
    let output_path = resolve_output_file(&cfg.output, cfg.format, &default_name);
    if let Some(parent) = output_path.parent() {
        ensure_output_dir(parent)?;
    }
    match cfg.format {
        OutputFormat::Json => write_export_json(&export, &output_path, app.export.pretty)?,
        OutputFormat::Markdown => write_markdown_report(&export, &output_path)?,
        OutputFormat::Jsonl => {
            let summary = summarize(1, bundle_hash.clone(), &analysis);
            write_summary_jsonl(&[summary], &output_path)?
        }
    }
    tracing::info!("report written to {}", output_path.display());

    let export_hash = hash_file(&output_path)?;
    let manifest = build_manifest(&app.export.version, bundle_hash, export_hash);
    if let Some(path) = &cfg.manifest {
        write_manifest(&manifest, path)?;
        tracing::info!("manifest written to {}", path.display());
    }
    Ok(manifest)
}

pub fn run_replay_with_config(cfg: &RunConfig) -> Result<Vec<ReplaySummary>> {
    let data = fs::read_to_string(&cfg.input)
        .with_context(|| format!("reading fixture {}", cfg.input.display()))?;

    let mut summaries = Vec::new();
    for (idx, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let bundle = SignalBundle::from_json(line)
            .with_context(|| format!("{}:{}", cfg.input.display(), line_no))?;
        let analysis = analyze_fingerprint(&bundle);
        summaries.push(summarize(line_no, sha256_hex(line.as_bytes()), &analysis));
    }

    let output_path = resolve_output_file(&cfg.output, OutputFormat::Jsonl, "replay-summary");
    if let Some(parent) = output_path.parent() {
        ensure_output_dir(parent)?;
    }
    write_summary_jsonl(&summaries, &output_path)?;
    tracing::info!(
        bundles = summaries.len(),
        "replay summary written to {}",
        output_path.display()
    );
    Ok(summaries)
}

fn run_rules(kind: Option<RuleFamily>, id: Option<&str>) -> Result<()> {
    let lines = catalog_lines(kind);
    match id {
        None => {
            for line in lines {
                println!("{line}");
            }
            Ok(())
        }
        Some(id) => {
            if let Some(line) = describe_rule(id) {
                println!("{line}");
                return Ok(());
            }
            match closest_rule_id(id) {
                Some(best) => Err(anyhow!("unknown rule id: {id} (did you mean {best}?)")),
                None => Err(anyhow!("unknown rule id: {id}")),
            }
        }
    }
}

pub fn catalog_lines(kind: Option<RuleFamily>) -> Vec<String> {
    let mut lines = Vec::new();
    if kind != Some(RuleFamily::Anomaly) {
        for rule in RULES {
            lines.push(format!(
                "consistency  {:<34} {:<8} {}",
                rule.id, rule.severity, rule.name
            ));
        }
    }
    if kind != Some(RuleFamily::Consistency) {
        for indicator in INDICATORS {
            lines.push(format!(
                "anomaly      {:<34} {:<8} {}",
                indicator.id, indicator.severity, indicator.name
            ));
        }
    }
    lines
}

pub fn describe_rule(id: &str) -> Option<String> {
    if let Some(rule) = RULES.iter().find(|r| r.id == id) {
        return Some(format!(
            "{} [{} / {:?} / {:?}]\n{}",
            rule.name, rule.severity, rule.category, rule.kind, rule.description
        ));
    }
    INDICATORS.iter().find(|i| i.id == id).map(|i| {
        format!(
            "{} [{} / {}]\n{}",
            i.name, i.severity, i.anomaly_type, i.description
        )
    })
}

pub fn closest_rule_id(id: &str) -> Option<&'static str> {
    RULES
        .iter()
        .map(|r| r.id)
        .chain(INDICATORS.iter().map(|i| i.id))
        .map(|known| (known, strsim::jaro_winkler(id, known)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}

fn run_interpret(axis: Axis, score: u8) -> Result<()> {
    let (level, description, extra) = match axis {
        Axis::Uniqueness => {
            let band = interpret_uniqueness_score(score);
            (band.level, band.description, format!("trackability: {}", band.trackability))
        }
        Axis::Consistency => {
            let band = interpret_consistency_score(score);
            (band.level, band.description, format!("risk: {:?}", band.risk_level))
        }
        Axis::Anomaly => {
            let band = interpret_anomaly_score(score);
            (band.level, band.description, format!("risk: {:?}", band.risk_level))
        }
    };
    println!("{level} ({extra})\n{description}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_nearby_rule_ids() {
        assert_eq!(closest_rule_id("webdriver_flg"), Some("webdriver_flag"));
        assert_eq!(closest_rule_id("vm_gpus"), Some("vm_gpu"));
        assert_eq!(closest_rule_id("zzzzzzzz"), None);
    }

    #[test]
    fn catalog_filters_by_family() {
        assert_eq!(catalog_lines(None).len(), RULES.len() + INDICATORS.len());
        assert_eq!(catalog_lines(Some(RuleFamily::Consistency)).len(), 31);
        assert!(catalog_lines(Some(RuleFamily::Anomaly))
            .iter()
            .all(|l| l.starts_with("anomaly")));
    }

    #[test]
    fn describes_both_families() {
        let rule = describe_rule("webdriver_flag").unwrap();
        assert!(rule.contains("critical"));
        let indicator = describe_rule("vm_gpu").unwrap();
        assert!(indicator.contains("virtualization"));
        assert!(describe_rule("nope").is_none());
    }
}
