//! ldsync - keeps a SPARQL triplestore in sync with a linked-data repository
//!
//! One-shot entry point: synchronizes a single resource and prints the result.
//!
//! Usage:
//!   ldsync --identifier /objects/123 --base-url http://localhost:8080/fcrepo4/rest
//!   ldsync --identifier /objects/123 --base-url http://localhost:8080/fcrepo4/rest --operation DELETE

use clap::Parser;
use ldsync::config::PipelineArgs;
use ldsync::events::normalizer::normalize;
use ldsync::logging::init_tracing;
use ldsync::SyncPipeline;
use std::collections::HashMap;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "ldsync")]
#[command(about = "Synchronize one repository resource into a SPARQL triplestore", long_about = None)]
struct Args {
    /// Repository-relative path of the resource
    #[arg(short, long)]
    identifier: String,

    /// Repository REST root
    #[arg(short, long, env = "LDSYNC_BASE_URL")]
    base_url: String,

    /// Operation or event type (create, update, delete, HTTP method, event URI)
    #[arg(short, long)]
    operation: Option<String>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let mut headers = HashMap::new();
    headers.insert("identifier".to_string(), args.identifier);
    headers.insert("base_url".to_string(), args.base_url);
    if let Some(operation) = args.operation {
        headers.insert("operation".to_string(), operation);
    }

    let event = normalize(&headers)?;
    let pipeline = SyncPipeline::new(args.pipeline.into_config()?)?;

    match pipeline.synchronize(&event).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            error!(stage = e.stage(), retryable = e.is_retryable(), "synchronization failed");
            Err(e.into())
        }
    }
}
