// src/lib.rs

pub mod cli;
pub mod config;
pub mod driver;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod logstore;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod serializer;
pub mod status;
pub mod types;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, LogsAction};
use crate::config::{DriverSettings, load_and_validate};

pub use crate::driver::{Driver, DriverBuilder};
pub use crate::errors::DriverError;
pub use crate::progress::ProgressSnapshot;
pub use crate::request::{RenderRequest, Resolution, Selector};
pub use crate::types::{DriverStatus, RunOutcome, Stage, StatusView};

/// How often `render` prints progress while pbrt runs.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_and_validate(&args.config)
        .with_context(|| format!("loading driver settings from {}", args.config))?;

    match args.command {
        Command::Check => {
            print_settings(&settings);
            Ok(())
        }
        Command::Logs { action } => {
            let driver = Driver::new(settings)?;
            run_logs(&driver, action)
        }
        Command::Render { request } => {
            let driver = Driver::new(settings)?;
            run_render(&driver, Path::new(&request)).await
        }
    }
}

fn run_logs(driver: &Driver, action: LogsAction) -> Result<()> {
    match action {
        LogsAction::List => {
            for name in driver.list_logs()? {
                println!("{name}");
            }
        }
        LogsAction::Show { name } => print!("{}", driver.read_log(&name)?),
        LogsAction::Delete { name } => {
            driver.delete_log(&name)?;
            println!("deleted {name}");
        }
    }
    Ok(())
}

/// Submit one request and follow the run, printing transitions and
/// progress. Ctrl-C cancels the run.
async fn run_render(driver: &Driver, request_path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(request_path)
        .with_context(|| format!("reading render request {}", request_path.display()))?;
    let request: RenderRequest = serde_json::from_str(&text)
        .with_context(|| format!("parsing render request {}", request_path.display()))?;

    let mut transitions = driver.subscribe_transitions();
    let run_id = driver.submit(request)?;
    info!(run_id, "render submitted");

    {
        let driver = driver.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            eprintln!("cancelling render...");
            driver.cancel();
        });
    }

    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    loop {
        tokio::select! {
            event = transitions.recv() => match event {
                Ok(DriverStatus::Idle) | Err(RecvError::Closed) => break,
                Ok(status) => println!("status: {status}"),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "missed status transitions"),
            },
            _ = ticker.tick() => {
                let view = driver.status();
                if view.status.is_idle() {
                    break;
                }
                if let Some(p) = view.progress {
                    match p.fraction_done() {
                        Some(done) => println!(
                            "progress: {:.0}% ({:.1}s elapsed, {:.1}s remaining)",
                            done * 100.0,
                            p.elapsed_secs,
                            p.remaining_secs
                        ),
                        None => println!(
                            "progress: {:.1}s elapsed, {:.1}s remaining",
                            p.elapsed_secs, p.remaining_secs
                        ),
                    }
                }
            }
        }
    }
    driver.wait_idle().await;

    match driver.last_result() {
        Some(outcome) if outcome.succeeded => {
            println!("status: idle");
            println!(
                "render finished: {}",
                driver.result_image_path().display()
            );
            Ok(())
        }
        Some(outcome) => {
            println!("status: idle");
            if let Some(log) = &outcome.log_name {
                println!("log: {log}");
            }
            anyhow::bail!(
                "render failed in stage {}: {}",
                outcome
                    .failing_stage
                    .map(|s| s.as_str())
                    .unwrap_or("setup"),
                outcome.error.as_deref().unwrap_or("unknown error")
            )
        }
        None => anyhow::bail!("render ended without an outcome"),
    }
}

fn print_settings(settings: &DriverSettings) {
    println!("render-driver settings");
    println!("  workdir:      {}", settings.workdir.display());
    if settings.generator_is_script() {
        println!(
            "  generator:    {} {}",
            settings.python,
            settings.generator.display()
        );
    } else {
        println!("  generator:    {}", settings.generator.display());
    }
    println!("  renderer:     {}", settings.renderer.display());
    println!("  log_dir:      {}", settings.log_dir.display());
    println!("  config file:  {}", settings.config_path().display());
    println!("  scene file:   {}", settings.scene_path().display());
    println!("  output image: {}", settings.output_image_path().display());

    debug!("check complete (no execution)");
}
