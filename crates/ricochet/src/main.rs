//! Server binary: binds the WebSocket listener and runs until killed.
//!
//! Configuration comes from the environment:
//!
//! - `RICOCHET_ADDR` — listen address (default `0.0.0.0:8080`)
//! - `RUST_LOG` — tracing filter (default `info`)

use ricochet::{RicochetError, RicochetServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RicochetError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("RICOCHET_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = RicochetServer::builder().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await
}
