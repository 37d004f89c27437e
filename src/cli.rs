use crate::model::{CorrectionConfig, Report};
use crate::{corrector, metrics, storage};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "smooth-timings",
    version,
    about = "Replace latency spikes in benchmark CSV files with the nearest valid measurement"
)]
pub struct Cli {
    /// CSV file with clientTime, serverTime and totalTime columns
    pub input: PathBuf,

    /// clientTime values above this are treated as outliers
    #[arg(long, default_value_t = 70.0)]
    pub client_threshold: f64,

    /// serverTime values above this are treated as outliers
    #[arg(long, default_value_t = 80.0)]
    pub server_threshold: f64,

    /// Write the corrected CSV here instead of processed_<input name>
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this file
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Run silently: suppress all output except errors
    #[arg(long)]
    pub silent: bool,

    /// Compute and report corrections without writing the CSV
    #[arg(long)]
    pub dry_run: bool,

    /// Emit debug tracing on stderr (honours RUST_LOG)
    #[arg(long)]
    pub debug: bool,
}

/// Build a `CorrectionConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<CorrectionConfig> {
    for (name, value) in [
        ("--client-threshold", args.client_threshold),
        ("--server-threshold", args.server_threshold),
    ] {
        if !value.is_finite() {
            return Err(anyhow::anyhow!("{name} must be a finite number, got {value}"));
        }
    }
    Ok(CorrectionConfig {
        client_threshold: args.client_threshold,
        server_threshold: args.server_threshold,
    })
}

/// Load, correct and persist one file, returning the report without printing anything.
pub fn process(args: &Cli) -> Result<Report> {
    let config = build_config(args)?;

    if !args.input.exists() {
        return Err(anyhow::anyhow!(
            "input file '{}' does not exist",
            args.input.display()
        ));
    }

    let table = storage::load_table(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    let mut records = table.records.clone();
    let summary = corrector::correct(&mut records, &config);

    let output = if args.dry_run {
        tracing::info!("dry run, skipping CSV output");
        None
    } else {
        let path = args
            .output
            .clone()
            .unwrap_or_else(|| storage::processed_path(&args.input));
        storage::save_table(&path, &table, &records)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Some(path)
    };

    Ok(Report {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        input: args.input.clone(),
        output,
        config,
        summary,
        before: metrics::compute_timing_stats(&table.records),
        after: metrics::compute_timing_stats(&records),
    })
}

pub fn run(args: Cli) -> Result<()> {
    let report = process(&args)?;

    if let Some(p) = args.export_json.as_deref() {
        storage::export_json(p, &report)
            .with_context(|| format!("failed to export report to {}", p.display()))?;
    }

    if args.silent {
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        for line in crate::text_summary::build_text_summary(&report).lines {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: PathBuf) -> Cli {
        Cli::parse_from(["smooth-timings".into(), input.into_os_string()])
    }

    #[test]
    fn defaults_match_operational_thresholds() {
        let cli = args(PathBuf::from("search.csv"));
        let cfg = build_config(&cli).unwrap();
        assert_eq!(cfg.client_threshold, 70.0);
        assert_eq!(cfg.server_threshold, 80.0);
        assert!(!cli.dry_run);
    }

    #[test]
    fn thresholds_are_configurable() {
        let cli = Cli::parse_from([
            "smooth-timings",
            "--client-threshold",
            "1.5",
            "--server-threshold",
            "2",
            "search.csv",
        ]);
        let cfg = build_config(&cli).unwrap();
        assert_eq!(cfg.client_threshold, 1.5);
        assert_eq!(cfg.server_threshold, 2.0);
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let mut cli = args(PathBuf::from("search.csv"));
        cli.server_threshold = f64::INFINITY;
        let err = build_config(&cli).unwrap_err();
        assert!(err.to_string().contains("--server-threshold"));
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = process(&args(dir.path().join("absent.csv"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(!dir.path().join("processed_absent.csv").exists());
    }

    #[test]
    fn process_writes_processed_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("search.csv");
        std::fs::write(
            &input,
            "clientTime,serverTime,totalTime\n50,10,60\n90,10,100\n95,10,105\n60,10,70\n",
        )
        .unwrap();

        let report = process(&args(input.clone())).unwrap();
        assert_eq!(report.summary.client_corrections, 2);
        assert_eq!(report.summary.rows_modified, 2);
        assert_eq!(report.output, Some(dir.path().join("processed_search.csv")));

        let written = std::fs::read_to_string(dir.path().join("processed_search.csv")).unwrap();
        assert_eq!(
            written,
            "clientTime,serverTime,totalTime\n50,10,60\n50,10,60\n50,10,60\n60,10,70\n"
        );
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("search.csv");
        std::fs::write(&input, "clientTime,serverTime,totalTime\n90,10,100\n40,10,50\n").unwrap();

        let mut cli = args(input);
        cli.dry_run = true;
        let report = process(&cli).unwrap();
        assert_eq!(report.output, None);
        assert_eq!(report.summary.client_corrections, 1);
        assert!(!dir.path().join("processed_search.csv").exists());
    }
}
