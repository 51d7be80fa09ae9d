//! flowm - minimal floating window manager for X11

use anyhow::Result;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowm::config::Config;
use flowm::spawn;
use flowm::wm::display::X11Display;
use flowm::wm::errors::ErrorPolicy;
use flowm::wm::WindowManager;

fn run() -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load configuration: {:#}, using defaults", e);
        Config::default()
    });

    let policy = ErrorPolicy::startup();
    let display = X11Display::connect(&policy)?;

    spawn::ignore_child_signals()?;

    let mut wm = WindowManager::new(display, &config, policy)?;
    wm.start()?;
    wm.run()
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "flowm=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting flowm");

    match run() {
        Ok(()) => {
            info!("flowm exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("flowm: {:#}", e);
            ExitCode::from(1)
        }
    }
}
