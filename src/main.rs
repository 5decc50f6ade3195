mod cli;
mod logging;
mod sink;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use quota::{DryRunDeleter, EnforceOptions, Enforcer, FsBackend, RunSummary};
use sink::LogSink;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Startup failures exit non-zero; per-directory errors only reach the log
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ui::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    logging::init(&cli.log, cli.verbose)?;
    log::info!(
        "dirquota {} starting with config {}",
        env!("CARGO_PKG_VERSION"),
        cli.config.display()
    );

    let quotas = quota::config::load(&cli.config)
        .with_context(|| format!("Could not load config {}", cli.config.display()))?;
    for q in &quotas {
        log::debug!(
            "Configured {}: {} MB{}",
            q.path.display(),
            q.max_size_mb,
            if q.recursive { ", recursive" } else { "" }
        );
    }

    let summary = enforce_all(cli, &quotas);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Could not serialize summary")?
        );
    } else if !cli.quiet {
        ui::run_summary(&summary, cli.dry_run, &cli.log);
    }

    Ok(())
}

fn enforce_all(cli: &Cli, quotas: &[quota::DirectoryQuota]) -> RunSummary {
    let sink = LogSink::new(cli.dry_run);
    let options = EnforceOptions {
        max_consecutive_denials: cli.max_denials,
    };
    let fs = FsBackend::new();

    if cli.dry_run {
        Enforcer::new(fs, DryRunDeleter, &sink)
            .with_options(options)
            .run(quotas)
    } else {
        Enforcer::new(fs, fs, &sink).with_options(options).run(quotas)
    }
}
