use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::types::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "printscope",
    version,
    about = "Browser fingerprint privacy audit"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (debug, trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (TOML). Default: config/printscope.toml
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Optional log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse one collected signal bundle
    Analyze {
        /// Bundle JSON produced by the collectors
        #[arg(long)]
        input: PathBuf,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormatArg>,
        /// Output path (file or directory)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Manifest output path
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Analyse every bundle in a JSONL fixture
    Replay {
        #[arg(long)]
        fixture: PathBuf,
        /// Output path (file or directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List consistency rules and anomaly indicators
    Rules {
        /// Restrict to one family
        #[arg(long, value_enum)]
        kind: Option<RuleFamily>,
        /// Show a single entry
        #[arg(long)]
        id: Option<String>,
    },
    /// Explain a score on one axis
    Interpret {
        #[arg(long, value_enum)]
        axis: Axis,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        score: u8,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormatArg {
    Json,
    Markdown,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(value: OutputFormatArg) -> Self {
        match value {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleFamily {
    Consistency,
    Anomaly,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Uniqueness,
    Consistency,
    Anomaly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyze_with_globals() {
        let cli = Cli::try_parse_from([
            "printscope",
            "-vv",
            "analyze",
            "--input",
            "bundle.json",
            "--format",
            "markdown",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Analyze { input, format, .. } => {
                assert_eq!(input, PathBuf::from("bundle.json"));
                assert!(matches!(format, Some(OutputFormatArg::Markdown)));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn interpret_rejects_out_of_range_scores() {
        let err = Cli::try_parse_from([
            "printscope",
            "interpret",
            "--axis",
            "anomaly",
            "--score",
            "101",
        ]);
        assert!(err.is_err());
    }
}
