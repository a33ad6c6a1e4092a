// Core architecture components
mod clock;
mod config;
mod core;
mod core_builder;
mod error;
mod identity;
mod registry;

// Sign-in message and signature checks
mod message;
mod verifier;
pub mod wallet;

// Sessions and their transport
mod credential;
mod session;
pub mod signature;

// Storage and cleanup systems
pub mod cleanup;
pub mod storage;

// Metrics (optional feature)
#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(test)]
mod testing;

// Core components exports
pub use self::core::{AuthCore, LoginState, SignIn};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AuthConfig, ConfigPreset, ENV_COOKIE_NAME, ENV_DEPLOYMENT, ENV_DOMAIN, ENV_NONCE_TTL,
    ENV_SESSION_SECRET, ENV_SESSION_TTL, SessionSecret,
};
pub use core_builder::AuthCoreBuilder;
pub use error::{AuthError, NonceError, SessionError, VerificationError};
pub use identity::{ANONYMOUS_IDENTITY, Identity};
pub use registry::{NonceGeneratorFn, NonceRegistry};

// Message and signature exports
pub use message::SignInMessage;
pub use verifier::SignedMessageVerifier;
pub use wallet::{Eip191Verifier, WalletSignatureVerifier};

// Session exports
pub use credential::{CookieAttributes, CredentialStore, MemoryCredentialStore, SameSite};
pub use session::{MintedSession, Session, SessionIssuer};
pub use signature::{HmacSha256Signer, SessionSigner};

// Storage and cleanup exports
pub use cleanup::{
    BoxedCleanupStrategy, CleanupStrategy, CustomCleanupStrategy, HybridCleanupStrategy,
};
pub use storage::{MemoryNonceStore, NonceEntry, NonceStore, StorageStats};

// Metrics exports (optional feature)
#[cfg(feature = "metrics")]
pub use metrics::{
    AuthMetrics, ErrorMetrics, InMemoryMetricsCollector, MetricEvent, MetricsCollector,
    NoOpMetricsCollector, PerformanceMetrics,
};
