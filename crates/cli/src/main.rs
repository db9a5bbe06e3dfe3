//! `almanac-sync` - run and inspect Almanac source syncs.
//!
//! This is a terminal tool, so results are written with `println!`; process
//! diagnostics go through `tracing`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use almanac_domain::{SyncRun, SyncRunSnapshot};
use almanac_infra::config;
use almanac_infra::services::SyncService;
use anyhow::Context;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{info, warn};

mod command;
mod telemetry;

use command::Command;

const WATCH_DRAIN: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = telemetry::init() {
        eprintln!("Failed to initialise logging: {err}");
    }

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "could not load .env"),
    }

    let command = match Command::parse(env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err:#}");
            eprintln!();
            eprintln!("{}", command::usage());
            return ExitCode::from(2);
        }
    };

    match run(command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Execute `command`; `Ok(false)` means it ran but a sync failed.
async fn run(command: Command) -> anyhow::Result<bool> {
    if command == Command::Help {
        println!("{}", command::usage());
        return Ok(true);
    }

    let mut config = config::load().context("failed to load configuration")?;
    if matches!(command, Command::Sync { watch: true, .. } | Command::Resume { watch: true, .. }) {
        config.sync.broadcast_enabled = true;
    }
    let service = SyncService::open(config).context("failed to open the database")?;

    match command {
        Command::Sync { source: Some(source), watch } => {
            let watcher = watch.then(|| watch_progress(&service));
            let result = service.run(&source).await;
            stop(watcher).await;
            Ok(report(&source, &result))
        }
        Command::Sync { source: None, watch } => {
            let watcher = watch.then(|| watch_progress(&service));
            let results = service.run_all().await;
            stop(watcher).await;
            if results.is_empty() {
                println!("No sources are configured.");
            }
            let mut all_ok = true;
            for (source, result) in &results {
                all_ok &= report(source, result);
            }
            Ok(all_ok)
        }
        Command::Enqueue { source } => {
            let run = service.enqueue(&source, false).await?;
            println!("{}", run.id);
            Ok(true)
        }
        Command::Resume { run_id, watch } => {
            let watcher = watch.then(|| watch_progress(&service));
            let result = service.resume(run_id).await;
            stop(watcher).await;
            Ok(report(&run_id.to_string(), &result))
        }
        Command::Runs { source, limit } => {
            for run in service.recent_runs(source.as_deref(), limit).await? {
                print_run(&run);
            }
            Ok(true)
        }
        Command::Logs { run_id } => {
            for record in service.run_logs(run_id).await? {
                println!(
                    "{} {:<7} {}",
                    record.created_at.format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level,
                    record.message
                );
            }
            Ok(true)
        }
        Command::Sources => {
            for source in service.enabled_sources() {
                println!("{source}");
            }
            Ok(true)
        }
        Command::Health => {
            service.health_check()?;
            println!("ok");
            Ok(true)
        }
        Command::Help => Ok(true),
    }
}

fn report(label: &str, result: &almanac_domain::Result<SyncRun>) -> bool {
    match result {
        Ok(run) => {
            println!("{label}: {} ({})", run.summary(), run.id);
            true
        }
        Err(err) => {
            println!("{label}: failed: {err}");
            false
        }
    }
}

fn print_run(run: &SyncRun) {
    let total = run.total_items.map_or_else(|| "?".to_string(), |total| total.to_string());
    println!(
        "{}  {:<16} {:<9} {:>5}/{:<5} {}",
        run.id,
        run.source_type,
        run.status,
        run.processed_items,
        total,
        run.error_message.as_deref().unwrap_or_default()
    );
}

fn watch_progress(service: &SyncService) -> JoinHandle<()> {
    let mut updates = service.broadcaster().subscribe();
    tokio::spawn(async move {
        while let Some(snapshot) = updates.next().await {
            print_snapshot(&snapshot);
        }
    })
}

fn print_snapshot(snapshot: &SyncRunSnapshot) {
    println!(
        "[{}] {} {:>3}% ({} processed)",
        snapshot.source_type, snapshot.status, snapshot.percentage, snapshot.processed_items
    );
}

/// Let the watcher drain snapshots already published, then end it.
async fn stop(watcher: Option<JoinHandle<()>>) {
    if let Some(mut handle) = watcher {
        let _ = tokio::time::timeout(WATCH_DRAIN, &mut handle).await;
        handle.abort();
    }
}
