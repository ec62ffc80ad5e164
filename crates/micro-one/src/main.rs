//! micro-one binary: the sender service.

use anyhow::Result;
use clap::Parser;
use micro_common::config::{LoggingArgs, ServiceConfig, SidecarArgs};
use micro_common::logging::init_logging;
use micro_common::server::{shutdown_signal, start_server};
use micro_common::DaprHttpClient;
use micro_one::{build_router, AppState, MessageDispatcher};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "micro-one")]
#[command(about = "Sender service: forwards messages through the sidecar", version)]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "PORT", default_value_t = ServiceConfig::SENDER_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// App id this service is registered under with the sidecar
    #[arg(long, env = "APP_ID", default_value = ServiceConfig::SENDER_ID)]
    app_id: String,

    #[command(flatten)]
    sidecar: SidecarArgs,

    #[command(flatten)]
    logging: LoggingArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.logging);

    let sidecar = Arc::new(DaprHttpClient::from_args(&args.sidecar)?);
    info!(app_id = %args.app_id, sidecar = %sidecar.base_url(), "Starting micro-one service");

    let dispatcher = MessageDispatcher::new(sidecar, args.app_id.clone());
    let router = build_router(AppState::new(dispatcher));

    let server = start_server(router, &args.host, args.port, shutdown_signal()).await?;

    // Supervisors and tests read the bound address from stdout.
    println!("LISTENING_ADDR={}", server.addr);

    server.wait().await;
    info!("Shutting down micro-one service");

    Ok(())
}
