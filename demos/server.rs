//! Sign-in server over the in-memory nonce store.
//!
//! ```bash
//! export WALLET_AUTH_SESSION_SECRET="at least 32 bytes of secret material"
//! export FRONTEND_URL=http://localhost:3000
//! RUST_LOG=wallet_auth=debug cargo run --example server --features http
//! ```

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use wallet_auth::http::{self, HttpConfig};
use wallet_auth::{AuthConfig, AuthCore, ConfigPreset};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wallet_auth=info")),
        )
        .init();

    let core = AuthCore::builder(AuthConfig::from(ConfigPreset::FromEnv))
        .build_and_init()
        .await?;

    http::serve(Arc::new(core), HttpConfig::from_env()).await?;
    Ok(())
}
