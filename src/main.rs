//! Serves the demonstration API.
//!
//! Run with:
//!   RUST_LOG=debug cargo run
//!
//! Try:
//!   curl 'http://localhost:3000/filters?secretKey=ValidFormatAndValueKey'
//!   curl 'http://localhost:3000/search?something=a&something=b&something=c'
//!   curl 'http://localhost:3000/search-as-parameter?Title=T&Author=A&Year=2024'
//!   curl http://localhost:3000/short-circuiting
//!   curl -F file=@Cargo.toml http://localhost:3000/upload-file

use sluice::{Config, Server, app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> sluice::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    Server::new(config.bind_address)
        .serve(app::router(&config))
        .await
}
