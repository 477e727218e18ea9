//! `msap-node`: serve a simulated node's management port over TCP.

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use msap_runner::{MsapServer, RunnerConfig, RunnerError};

#[derive(Parser, Debug)]
#[command(name = "msap-node", version, about = "Simulated mesh node MSAP port")]
struct Args {
    /// YAML node configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration.
    #[arg(short, long)]
    listen: Option<String>,

    /// Log filter (e.g. `debug`, `msap_core=trace`). Defaults to `RUST_LOG`, then `info`.
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), RunnerError> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let mut config = match &args.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    msap_metrics::describe_metrics();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    })?;

    let server = MsapServer::bind(&config).await?;
    server.info().print_table();
    server.run(shutdown_rx).await?;

    info!("stopped");
    Ok(())
}
