//! micro-two binary: the receiver service.

use anyhow::Result;
use clap::Parser;
use micro_common::config::{LoggingArgs, MessagingConfig, ServiceConfig, SidecarArgs};
use micro_common::logging::init_logging;
use micro_common::server::{shutdown_signal, start_server};
use micro_common::DaprHttpClient;
use micro_two::{build_router, AppState, MessageProcessor, StateStoreBridge};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "micro-two")]
#[command(about = "Receiver service: processes and records messages", version)]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "PORT", default_value_t = ServiceConfig::RECEIVER_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// App id this service is registered under with the sidecar
    #[arg(long, env = "APP_ID", default_value = ServiceConfig::RECEIVER_ID)]
    app_id: String,

    /// Sidecar state store component processed messages are saved to
    #[arg(long, env = "STATE_STORE_NAME", default_value = MessagingConfig::DEFAULT_STATE_STORE)]
    state_store: String,

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
    info!(app_id = %args.app_id, sidecar = %sidecar.base_url(), "Starting micro-two service");

    let bridge = StateStoreBridge::new(sidecar, args.state_store.clone(), args.app_id.clone());
    info!(state_store = bridge.store_name(), "Persisting processed messages");
    let router = build_router(AppState::new(MessageProcessor::new(bridge), args.app_id.clone()));

    let server = start_server(router, &args.host, args.port, shutdown_signal()).await?;

    // Supervisors and tests read the bound address from stdout.
    println!("LISTENING_ADDR={}", server.addr);

    server.wait().await;
    info!("Shutting down micro-two service");

    Ok(())
}
