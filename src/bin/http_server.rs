//! HTTP Server Binary for ldsync
//!
//! Starts the webhook endpoint that synchronizes resources as change events
//! arrive.
//!
//! Usage:
//!   cargo run --bin http_server -- --host 0.0.0.0 --port 8080 \
//!       --triplestore-update-url http://localhost:3030/test/update

use clap::Parser;
use ldsync::config::PipelineArgs;
use ldsync::http::start_server;
use ldsync::logging::init_tracing;
use ldsync::SyncPipeline;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ldsync HTTP Server")]
#[command(about = "Webhook server keeping a SPARQL triplestore in sync with a repository", long_about = None)]
struct Args {
    #[arg(short = 'H', long, env = "LDSYNC_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, env = "LDSYNC_PORT", default_value = "8080")]
    port: u16,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let config = args.pipeline.into_config()?;
    info!(
        update_url = %config.triplestore_update_url,
        accept = config.accept.media_type(),
        timeout_secs = config.timeout_secs,
        "initializing sync pipeline"
    );
    let pipeline = Arc::new(SyncPipeline::new(config)?);

    let addr = format!("{}:{}", args.host, args.port);

    // Set up graceful shutdown
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install CTRL+C handler");
        }
        info!("shutdown signal received, stopping server");
    };

    tokio::select! {
        result = start_server(&addr, pipeline) => {
            if let Err(e) = result {
                error!(error = %e, "server error");
                return Err(e);
            }
        }
        () = shutdown_signal => {
            info!("server shut down gracefully");
        }
    }

    Ok(())
}
