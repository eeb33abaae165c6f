//! Pipesim - simulated CI/CD pipeline CLI
//!
//! The `pipesim` command drives a row of named stages through a simulated
//! pipeline run, rendering stage progress and notifications on the terminal.
//!
//! ## Commands
//!
//! - `run`: run the pipeline one or more times
//! - `config`: print the effective configuration

mod terminal;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pipesim_ci::{
    init_tracing, LogFormat, PipelineConfig, PipelineRunner, RandomOutcomes, RunOutcome,
    StageSnapshot, TimedNotifier,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use terminal::{Board, TerminalDisplay, TerminalSink};

#[derive(Parser)]
#[command(name = "pipesim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Simulated CI/CD pipeline runner", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Pipeline configuration file (TOML)
    #[arg(short, long, global = true, env = "PIPESIM_CONFIG")]
    config: Option<PathBuf>,

    /// Stages to run, comma-separated (overrides the config file)
    #[arg(short, long, global = true, env = "PIPESIM_STAGES")]
    stages: Option<String>,

    /// Probability that a stage succeeds (overrides the config file)
    #[arg(long, global = true, env = "PIPESIM_SUCCESS_RATE")]
    success_rate: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline
    Run {
        /// Number of back-to-back runs
        #[arg(short = 'n', long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        runs: u32,

        /// Print a JSON report instead of the text summary
        #[arg(long)]
        json_report: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Outcome and final stage statuses of one run.
#[derive(Debug, Serialize)]
struct RunSummary {
    run: u32,
    #[serde(flatten)]
    outcome: RunOutcome,
    stages: Vec<StageSnapshot>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let format = if cli.json { LogFormat::Json } else { LogFormat::Text };
    init_tracing(format, level);

    let config = resolve_config(
        cli.config.as_deref(),
        cli.stages.as_deref(),
        cli.success_rate,
    )?;

    match cli.command {
        Commands::Run { runs, json_report } => {
            cmd_run(&config, runs, json_report, &mut std::io::stdout()).await
        }
        Commands::Config => cmd_config(&config),
    }
}

/// Merge defaults, the optional config file and command-line overrides.
fn resolve_config(
    path: Option<&Path>,
    stages: Option<&str>,
    success_rate: Option<f64>,
) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => PipelineConfig::default(),
    };

    if let Some(stages) = stages {
        config = config.with_stage_list(stages);
    }
    if let Some(rate) = success_rate {
        config = config.with_success_rate(rate);
    }

    config.validate().context("Invalid pipeline configuration")?;
    Ok(config)
}

/// Run the pipeline `runs` times and report each outcome to `out`.
///
/// With `json_report`, `out` receives only the JSON report; the live board
/// goes to stderr.
async fn cmd_run(
    config: &PipelineConfig,
    runs: u32,
    json_report: bool,
    out: &mut impl Write,
) -> Result<()> {
    let board = Board::for_report(json_report);
    let notifier = TimedNotifier::new(
        Arc::new(TerminalSink::new(board)),
        config.notification_ttl(),
    );
    let outcomes = RandomOutcomes::from_config(config).context("Invalid outcome settings")?;
    let runner = PipelineRunner::new(
        config,
        Arc::new(TerminalDisplay::new(board)),
        Arc::new(notifier),
        Arc::new(outcomes),
    )
    .context("Failed to set up pipeline")?;

    let stages: Vec<String> = runner.stage_ids().iter().map(|id| id.to_string()).collect();
    info!(stages = %stages.join(","), "Pipeline ready to run");

    let mut summaries = Vec::with_capacity(runs as usize);
    for run in 1..=runs {
        if !json_report {
            writeln!(out, "Run {}/{}", run, runs)?;
        }
        let outcome = runner.start().await;
        summaries.push(RunSummary {
            run,
            outcome,
            stages: runner.snapshot(),
        });
        if !json_report {
            writeln!(out)?;
        }
    }

    if json_report {
        serde_json::to_writer_pretty(&mut *out, &summaries)?;
        writeln!(out)?;
    } else {
        write_summary(out, &summaries)?;
    }

    let aborted = summaries
        .iter()
        .filter(|s| !s.outcome.is_completed())
        .count();
    if aborted == 0 {
        Ok(())
    } else {
        anyhow::bail!("{} of {} pipeline run(s) failed", aborted, runs)
    }
}

fn write_summary(out: &mut impl Write, summaries: &[RunSummary]) -> Result<()> {
    for summary in summaries {
        match &summary.outcome {
            RunOutcome::Completed => writeln!(out, "Run {}: ✓ PASSED", summary.run)?,
            RunOutcome::Aborted { stage, position } => writeln!(
                out,
                "Run {}: ✗ FAILED at {} (stage {}/{})",
                summary.run,
                stage,
                position + 1,
                summary.stages.len()
            )?,
            RunOutcome::NotStarted => writeln!(out, "Run {}: not started", summary.run)?,
        }
    }

    let passed = summaries
        .iter()
        .filter(|s| s.outcome.is_completed())
        .count();
    writeln!(out)?;
    writeln!(out, "Summary: {}/{} runs passed", passed, summaries.len())?;
    Ok(())
}

/// Print the effective configuration.
fn cmd_config(config: &PipelineConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    print!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let config = resolve_config(None, None, None).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_resolve_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stages = [\"lint\", \"build\"]").unwrap();
        writeln!(file, "success_rate = 0.25").unwrap();

        let config = resolve_config(Some(file.path()), Some("build, ship"), None).unwrap();
        assert_eq!(config.stages, vec!["build", "ship"]);
        assert_eq!(config.success_rate, 0.25);

        let config = resolve_config(Some(file.path()), None, Some(1.0)).unwrap();
        assert_eq!(config.stages, vec!["lint", "build"]);
        assert_eq!(config.success_rate, 1.0);
    }

    #[test]
    fn test_resolve_rejects_invalid_override() {
        let err = resolve_config(None, None, Some(2.0)).unwrap_err();
        assert!(format!("{:#}", err).contains("success_rate"));

        assert!(resolve_config(None, Some("build,,test"), None).is_err());
    }

    #[test]
    fn test_resolve_missing_file() {
        let err = resolve_config(Some(Path::new("/nonexistent/pipesim.toml")), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&PipelineConfig::default()).unwrap();
        let parsed = PipelineConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(parsed, PipelineConfig::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cmd_run_succeeds_when_every_stage_passes() {
        let config = resolve_config(None, Some("checkout,build"), Some(1.0)).unwrap();
        let mut out = Vec::new();
        cmd_run(&config, 2, true, &mut out).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_json_report_stream_is_only_json() {
        let config = resolve_config(None, Some("checkout,build"), Some(1.0)).unwrap();
        let mut out = Vec::new();
        cmd_run(&config, 2, true, &mut out).await.unwrap();

        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let runs = report.as_array().unwrap();
        assert_eq!(runs.len(), 2);
        for (i, run) in runs.iter().enumerate() {
            assert_eq!(run["run"], i as u64 + 1);
            assert_eq!(run["outcome"], "completed");
            assert_eq!(run["stages"].as_array().unwrap().len(), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_summary_written_to_output() {
        let config = resolve_config(None, Some("build"), Some(1.0)).unwrap();
        let mut out = Vec::new();
        cmd_run(&config, 1, false, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Run 1/1\n"));
        assert!(text.contains("Run 1: ✓ PASSED"));
        assert!(text.ends_with("Summary: 1/1 runs passed\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cmd_run_fails_when_a_stage_fails() {
        let config = resolve_config(None, None, Some(0.0)).unwrap();
        let mut out = Vec::new();
        let err = cmd_run(&config, 1, false, &mut out).await.unwrap_err();
        assert!(err.to_string().contains("1 of 1 pipeline run(s) failed"));
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "pipesim",
            "run",
            "--runs",
            "3",
            "--stages",
            "a,b",
            "--json-report",
        ])
        .unwrap();
        assert_eq!(cli.stages.as_deref(), Some("a,b"));
        match cli.command {
            Commands::Run { runs, json_report } => {
                assert_eq!(runs, 3);
                assert!(json_report);
            }
            Commands::Config => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_rejects_zero_runs() {
        assert!(Cli::try_parse_from(["pipesim", "run", "--runs", "0"]).is_err());
    }
}
