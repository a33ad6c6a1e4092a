//! # Wallet Auth
//!
//! Sign-In with Ethereum (EIP-4361) authentication core: single-use nonces,
//! signed-message verification and stateless sessions.
//!
//! A client proves control of a wallet address in three steps:
//!
//! 1. it asks for a nonce bound to its address,
//! 2. it has the wallet sign an EIP-4361 message embedding that nonce,
//! 3. it submits the message and signature; on success a signed session
//!    token is stored in its credential jar (a cookie in a web deployment).
//!
//! ## Features
//!
//! - **Single-use nonces**: consumed by the first attempt, successful or not
//! - **Short-lived nonces**: expire after two minutes by default
//! - **EIP-191 signatures**: secp256k1 recovery via the `siwe` crate
//! - **Stateless sessions**: HMAC-SHA256 signed tokens with embedded expiry
//! - **Pluggable seams**: nonce storage, clock, wallet signature check,
//!   session signer and credential jar are all traits
//! - **HTTP surface** (feature `http`): axum routes with cookie transport
//! - **Metrics** (feature `metrics`): pluggable event collectors
//!
//! ## Quick Start
//!
//! ```rust
//! use wallet_auth::{AuthConfig, AuthCore, AuthError, MemoryCredentialStore};
//!
//! # async fn example(message: &str, signature: &str) -> Result<(), AuthError> {
//! let core = AuthCore::builder(AuthConfig::new(b"an example session secret of 32+ bytes"))
//!     .build_and_init()
//!     .await?;
//!
//! // Step 1: hand the nonce to the client
//! let nonce = core
//!     .request_nonce(Some("0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B"))
//!     .await?;
//!
//! // Step 3: the client returns the signed message
//! let mut jar = MemoryCredentialStore::new();
//! match core.verify_and_establish(message, signature, &mut jar).await {
//!     Ok(sign_in) => println!("welcome {}", sign_in.identity),
//!     Err(AuthError::Unauthorized) => println!("request a new nonce and try again"),
//!     Err(e) => println!("sign-in failed: {e}"),
//! }
//!
//! // Later requests
//! if let Some(session) = core.current_session(&jar) {
//!     println!("{} is signed in until {}", session.identity, session.expires_at);
//! }
//! core.end_session(&mut jar);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`AuthConfig`] can be loaded from the environment:
//!
//! ```bash
//! export WALLET_AUTH_SESSION_SECRET="at least 32 bytes of secret material"
//! export WALLET_AUTH_NONCE_TTL=120
//! export WALLET_AUTH_SESSION_TTL=604800
//! export WALLET_AUTH_ENV=production   # Secure cookies
//! export WALLET_AUTH_DOMAIN=app.example.com
//! ```
//!
//! ## Architecture
//!
//! - **[`NonceRegistry`]**: issues and consumes per-address nonces over a [`NonceStore`]
//! - **[`SignedMessageVerifier`]**: parses [`SignInMessage`]s and checks nonce,
//!   domain, validity window and signature
//! - **[`SessionIssuer`]**: mints and validates session tokens
//! - **[`AuthCore`]**: composes the above into the sign-in flows
//! - **[`AuthError`]**: the error taxonomy surfaced to callers
//! - **`http`** (feature `http`): axum router and server over an [`AuthCore`]

pub mod auth;

#[cfg(feature = "http")]
pub mod http;

pub use auth::*;
