// SPDX-License-Identifier: GPL-3.0-or-later
use structopt::StructOpt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use thermal_relay::{Args, Pipeline, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::from_args();
    let config = Settings::from_path(&args.config_path)?;
    let pipeline = Pipeline::new(config)?;
    let shutdown = pipeline.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupted, shutting down"),
            Err(err) => error!("Unable to listen for Ctrl-C: {}", err),
        }
        shutdown.cancel();
    });
    pipeline.await
}
