//! Local in-memory triplestore for trying ldsync without a real SPARQL server.
//!
//! Usage:
//!   cargo run --bin ldsync-store -- --port 3030 --prefix /test

use clap::Parser;
use ldsync::logging::init_tracing;
use ldsync::store::EmbeddedTriplestore;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ldsync-store")]
#[command(about = "In-memory SPARQL 1.1 protocol endpoint backed by oxigraph")]
struct Args {
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value = "3030")]
    port: u16,

    /// Path prefix of the query and update endpoints
    #[arg(long, default_value = "/test")]
    prefix: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let addr = format!("{}:{}", args.host, args.port);
    let store = EmbeddedTriplestore::bind(&addr, &args.prefix).await?;
    info!(query = %store.query_url(), update = %store.update_url(), "endpoints ready");

    tokio::signal::ctrl_c().await?;
    info!(triples = store.triple_count()?, "stopping");
    store.shutdown().await;

    Ok(())
}
