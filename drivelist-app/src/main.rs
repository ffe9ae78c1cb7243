// SPDX-License-Identifier: GPL-3.0-only

//! CLI host for the drive inventory engine.
//!
//! Stands in for the plugin ABI layer: loads measures from a TOML
//! file, drives the periodic tick loop, prints each measure's numeric
//! and string values, and forwards navigation commands read from
//! stdin.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use drivelist_core::{
    Measure, MeasureContext, OwnerRegistry, ScopeId, ShellActionRunner, UDisksProbe, VolumeProbe,
};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod config;
use config::AppConfig;

#[derive(Parser)]
#[command(name = "drivelist")]
#[command(about = "Filtered drive inventory with background refresh", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the raw probe output (class and readiness per volume)
    Probe,
    /// Load a measure configuration and run the tick loop, forwarding
    /// navigation commands read from stdin ("<measure> <verb>")
    Run {
        /// TOML file with one [[measure]] table per measure
        #[arg(long)]
        config: PathBuf,
        /// Milliseconds between ticks
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Stop after this many ticks; default is to run until
        /// interrupted
        #[arg(long)]
        ticks: Option<u64>,
    },
}

// Per-crate targets use the underscored crate names.
const DEFAULT_LOG_FILTER: &str = "drivelist_core=info,drivelist_app=info,warn";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Probe => probe().await,
        Commands::Run {
            config,
            interval_ms,
            ticks,
        } => run(config, interval_ms, ticks).await,
    }
}

async fn probe() -> Result<()> {
    let probe = UDisksProbe::new().await?;
    for volume in probe.probe().await? {
        println!(
            "{:<16} {:<10} {}",
            volume.ident,
            volume.class,
            if volume.ready { "ready" } else { "not-ready" }
        );
    }
    Ok(())
}

async fn run(path: PathBuf, interval_ms: u64, ticks: Option<u64>) -> Result<()> {
    let app_config = AppConfig::load(&path)?;
    if app_config.measure.is_empty() {
        anyhow::bail!("no measures defined in {}", path.display());
    }

    let ctx = MeasureContext {
        registry: Arc::new(OwnerRegistry::new()),
        probe: Arc::new(UDisksProbe::new().await?),
        actions: Arc::new(ShellActionRunner),
        runtime: tokio::runtime::Handle::current(),
    };

    // Single scope for the whole file; configure owners first so
    // dependents can resolve their bindings regardless of file order.
    let scope = ScopeId(0);
    let mut measures: Vec<Measure> = Vec::new();
    for pass_owners in [true, false] {
        for cfg in &app_config.measure {
            if cfg.is_owner() != pass_owners {
                continue;
            }
            if cfg.name.is_empty() {
                tracing::warn!("skipping measure with no name");
                continue;
            }
            let mut measure = Measure::new(scope, ctx.clone());
            measure.configure(cfg);
            measures.push(measure);
        }
    }

    // Navigation commands arrive on stdin, one per line, as
    // "<measure> <verb>" (e.g. "drive0 forward"); they are applied
    // at the start of the next tick.
    let (tx, mut commands) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut remaining = ticks;
    loop {
        while let Ok(line) = commands.try_recv() {
            dispatch_command(&mut measures, &line);
        }

        for measure in &measures {
            let value = measure.update();
            println!(
                "{}: value={} string={:?}",
                measure.name(),
                value,
                measure.string_value()
            );
        }

        if let Some(n) = remaining.as_mut() {
            if *n <= 1 {
                break;
            }
            *n -= 1;
        }
        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
    }
    Ok(())
}

/// Forward one stdin command line to the named measure. Malformed
/// lines and unknown names are logged and skipped.
fn dispatch_command(measures: &mut [Measure], line: &str) {
    let Some((name, verb)) = split_command(line) else {
        if !line.trim().is_empty() {
            tracing::warn!(line, "ignoring malformed command line");
        }
        return;
    };
    match measures.iter_mut().find(|m| m.name() == name) {
        Some(measure) => measure.command(verb),
        None => tracing::warn!(name, "command for unknown measure"),
    }
}

fn split_command(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let name = parts.next()?;
    let verb = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((name, verb))
}
