//! dockwatch daemon entry point.
//!
//! Prints every changed container snapshot as one JSON line on stdout.

use log::{error, info};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use dockwatch::{Config, Container, DockerRuntime, Error, Monitor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    // Load configuration
    let cfg = Config::load()?;
    info!("Starting dockwatch with config: {:?}", cfg);

    let runtime = DockerRuntime::connect(cfg.docker_socket.as_deref())?;

    // Graceful Shutdown
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        shutdown.cancel();
    });

    let print_snapshot = |containers: &[Container]| match serde_json::to_string(containers) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Failed to serialize snapshot: {}", e),
    };

    let mut monitor = Monitor::new(runtime, print_snapshot, cfg.options());
    match monitor.run(&cancel).await {
        Error::Cancelled => {
            info!("Shutdown complete.");
            Ok(())
        }
        e => {
            error!("Container monitor failed: {}", e);
            Err(e.into())
        }
    }
}
