use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::cli::flags::{Cli, Command};
use crate::core::types::OutputFormat;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub command: CommandName,
    /// Bundle JSON for `analyze`, JSONL fixture for `replay`.
    pub input: PathBuf,
    pub format: OutputFormat,
    pub output: PathBuf,
    pub manifest: Option<PathBuf>,
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    Analyze,
    Replay,
}

pub fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let (command, input, format_arg, output_opt, manifest_opt) = match &cli.command {
        Command::Analyze {
            input,
            format,
            output,
            manifest,
        } => (
            CommandName::Analyze,
            input.clone(),
            format.clone(),
            output.clone(),
            manifest.clone(),
        ),
        Command::Replay { fixture, output } => (
            CommandName::Replay,
            fixture.clone(),
            None,
            output.clone(),
            None,
        ),
        other => return Err(anyhow!("{other:?} does not write output")),
    };

    let format = match (format_arg, command) {
        (Some(fmt), _) => fmt.into(),
        (None, CommandName::Replay) => OutputFormat::Jsonl,
        (None, CommandName::Analyze) => OutputFormat::Json,
    };

    let output = output_opt.unwrap_or_else(|| PathBuf::from("out"));

    let manifest = match (manifest_opt, command) {
        (Some(p), _) => Some(p),
        (None, CommandName::Analyze) => {
            if output.is_dir() || output.extension().is_none() {
                Some(output.join("manifest.json"))
            } else {
                None
            }
        }
        (None, CommandName::Replay) => None,
    };

    Ok(RunConfig {
        command,
        input,
        format,
        output,
        manifest,
        config_path: cli.config.clone(),
    })
}

pub fn format_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Json => "json",
        OutputFormat::Jsonl => "jsonl",
        OutputFormat::Markdown => "md",
    }
}

pub fn ensure_output_dir(path: &Path) -> Result<()> {
    if path.exists() && path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

pub fn resolve_output_file(output: &Path, format: OutputFormat, default_name: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", default_name, format_extension(format)))
    } else {
        output.to_path_buf()
    }
}
