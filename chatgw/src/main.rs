use anyhow::Context;
use clap::Parser;
use tracing::info;

use chatgw::{
    config::{Args, Config},
    telemetry::init_telemetry,
};

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args).context("failed to load configuration")?;

    if args.validate {
        println!("Configuration is valid");
        return Ok(());
    }

    init_telemetry()?;
    chatgw::serve(config, shutdown_signal()).await
}
