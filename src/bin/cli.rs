use anyhow::{bail, Context, Result};
use crablapse::{RunMode, TimelapseConfig, TimelapseController};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() -> Result<()> {
    crablapse::init_logging();

    let mode = parse_mode(&env::args().collect::<Vec<_>>())?;

    let config = TimelapseConfig::load_or_default();
    if let Err(e) = config.validate() {
        bail!("Invalid configuration: {}", e);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        // Only flip the flag here; finalization runs on the main thread
        // once the capture loop observes it.
        log::info!("Termination signal received, shutting down");
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install signal handler")?;

    let controller = TimelapseController::new(config, cancel);
    controller.run(mode)?;
    Ok(())
}

fn parse_mode(args: &[String]) -> Result<RunMode> {
    match args.get(1).map(String::as_str) {
        None => Ok(RunMode::Capture),
        Some("--render-only") => Ok(RunMode::RenderOnly),
        Some(other) => {
            eprintln!("Usage: crablapse [--render-only]");
            bail!("Unknown argument: {}", other);
        }
    }
}
