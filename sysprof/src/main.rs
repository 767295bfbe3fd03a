//! Entry point for the sysprof agent. Parses args, then runs one reporting pass.

use anyhow::Context;
use std::env;

use sysprof::config::{Config, Settings};
use sysprof::report::{preview, Reporter, RunSummary};
use sysprof::{logging, ApiClient, ReportSession, Session};
use sysprof_probe::{default_probes, ProbeOptions};

struct ParsedArgs {
    target: Option<String>,
    dry_run: bool,
}

enum ArgsError {
    Help(String),
    Usage(String),
}

fn usage(prog: &str) -> String {
    format!("Usage: {prog} [--target NAME|-t NAME] [--dry-run]")
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, ArgsError> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "sysprof".into());
    let mut target: Option<String> = None;
    let mut dry_run = false; // --dry-run

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(ArgsError::Help(usage(&prog))),
            "--target" | "-t" => {
                target = it.next();
            }
            "--dry-run" => {
                dry_run = true;
            }
            _ if arg.starts_with("--target=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        target = Some(v.to_string());
                    }
                }
            }
            _ => {
                return Err(ArgsError::Usage(format!(
                    "Unexpected argument '{arg}'. {}",
                    usage(&prog)
                )));
            }
        }
    }
    Ok(ParsedArgs { target, dry_run })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(ArgsError::Help(msg)) => {
            eprintln!("{msg}");
            return Ok(());
        }
        Err(ArgsError::Usage(msg)) => anyhow::bail!(msg),
    };
    logging::init();

    if parsed.dry_run {
        return run_dry(parsed.target).await;
    }

    let config = Config::from_env()?;
    let target = parsed
        .target
        .or_else(|| config.target.clone())
        .unwrap_or_else(sysprof_probe::hostname);

    let client = ApiClient::new(&config.base_url(), config.timeout).context("building http client")?;
    let session = Session::new(client)
        .authenticate(&config.credentials)
        .await?;
    let report = session
        .register_report(&target, &config.register_path)
        .await?;
    println!("report {} opened for {}", report.report_id(), report.target());

    let probes = default_probes(&ProbeOptions {
        cpu_interval: config.cpu_interval,
        ..ProbeOptions::default()
    });
    let summary = Reporter::new(&report, &config.routes).run(probes).await;
    print_summary(&report, &summary);
    Ok(())
}

async fn run_dry(target: Option<String>) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    let target = target
        .or(settings.target)
        .unwrap_or_else(sysprof_probe::hostname);
    let probes = default_probes(&ProbeOptions {
        cpu_interval: settings.cpu_interval,
        ..ProbeOptions::default()
    });
    for fields in preview(probes, &target).await {
        println!("{}", serde_json::to_string(&fields)?);
    }
    Ok(())
}

fn print_summary(report: &ReportSession, summary: &RunSummary) {
    for o in &summary.outcomes {
        let note = if o.snapshot_missing { " (no snapshot)" } else { "" };
        match &o.result {
            Ok(_) => println!("  [ok]   {} -> {}{note}", o.field, o.path),
            Err(e) => println!("  [fail] {} -> {}{note}: {e}", o.field, o.path),
        }
    }
    for field in &summary.skipped {
        println!("  [skip] {field}: no route");
    }
    println!(
        "report {}: {} submitted, {} failed",
        report.report_id(),
        summary.submitted(),
        summary.failed()
    );
}
