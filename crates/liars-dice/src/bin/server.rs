//! Standalone Liar's Dice server.
//!
//! Usage: `LIARS_DICE_BIND=0.0.0.0:3001 cargo run -p liars-dice --bin liars-dice-server`

use liars_dice::{LiarsDiceError, LiarsDiceServer};

const DEFAULT_BIND: &str = "0.0.0.0:3001";

#[tokio::main]
async fn main() -> Result<(), LiarsDiceError> {
    liars_dice::init_logging();

    let addr = std::env::var("LIARS_DICE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let server = LiarsDiceServer::builder().bind(&addr).build().await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
