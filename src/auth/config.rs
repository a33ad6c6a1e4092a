use std::fmt;
use std::time::Duration;

use rand::RngCore;

/// Environment variable holding the nonce TTL in seconds.
pub const ENV_NONCE_TTL: &str = "WALLET_AUTH_NONCE_TTL";
/// Environment variable holding the session TTL in seconds.
pub const ENV_SESSION_TTL: &str = "WALLET_AUTH_SESSION_TTL";
/// Environment variable holding the session cookie name.
pub const ENV_COOKIE_NAME: &str = "WALLET_AUTH_COOKIE_NAME";
/// Environment variable naming the deployment; `production` enables secure cookies.
pub const ENV_DEPLOYMENT: &str = "WALLET_AUTH_ENV";
/// Environment variable holding the domain sign-in messages must be bound to.
pub const ENV_DOMAIN: &str = "WALLET_AUTH_DOMAIN";
/// Environment variable holding the session signing secret.
pub const ENV_SESSION_SECRET: &str = "WALLET_AUTH_SESSION_SECRET";

const DEFAULT_NONCE_TTL_SECS: u64 = 2 * 60;
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_COOKIE_NAME: &str = "access_token";
const MIN_SECRET_LEN: usize = 32;

/// Predefined configuration presets for common deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Production defaults:
    /// - Nonce TTL: 2 minutes
    /// - Session TTL: 7 days
    /// - Secure cookies
    Production,

    /// Local development:
    /// - Nonce TTL: 10 minutes (time to step through a wallet prompt in a debugger)
    /// - Session TTL: 1 day
    /// - Cookies without the `Secure` attribute, so plain `http://localhost` works
    Development,

    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `WALLET_AUTH_NONCE_TTL`: nonce TTL in seconds (default: 120)
    /// - `WALLET_AUTH_SESSION_TTL`: session TTL in seconds (default: 604800)
    /// - `WALLET_AUTH_COOKIE_NAME`: cookie name (default: `access_token`)
    /// - `WALLET_AUTH_ENV`: `production` enables secure cookies
    /// - `WALLET_AUTH_DOMAIN`: expected sign-in domain (default: unchecked)
    FromEnv,
}

/// Key material used to sign session tokens.
///
/// The `Debug` output never contains the key.
#[derive(Clone)]
pub struct SessionSecret(Vec<u8>);

impl SessionSecret {
    pub fn new(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// A fresh random 256-bit secret. Sessions signed with it do not survive a
    /// restart.
    pub fn random() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionSecret(<{} bytes>)", self.0.len())
    }
}

/// Configuration for the authentication core.
///
/// # Environment Variables
///
/// See [`ConfigPreset::FromEnv`]. The signing secret is always read from
/// `WALLET_AUTH_SESSION_SECRET`; when that is unset a random secret is
/// generated and a warning is logged.
///
/// # Example
///
/// ```rust
/// use wallet_auth::{AuthConfig, ConfigPreset};
/// use std::time::Duration;
///
/// let config = AuthConfig::from(ConfigPreset::Development)
///     .with_session_secret(b"a development secret that is long enough");
/// assert_eq!(config.nonce_ttl, Duration::from_secs(600));
/// assert!(!config.secure_cookies);
/// ```
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// How long an issued nonce stays consumable
    pub nonce_ttl: Duration,
    /// Lifetime of a minted session token and its cookie
    pub session_ttl: Duration,
    /// Name of the cookie carrying the session token
    pub cookie_name: String,
    /// Whether the session cookie carries the `Secure` attribute
    pub secure_cookies: bool,
    /// Domain sign-in messages must name, if any
    pub expected_domain: Option<String>,
    /// Key used to sign session tokens
    pub session_secret: SessionSecret,
}

impl AuthConfig {
    /// Production defaults with the given signing secret.
    pub fn new(session_secret: &[u8]) -> Self {
        Self {
            nonce_ttl: Duration::from_secs(DEFAULT_NONCE_TTL_SECS),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secure_cookies: true,
            expected_domain: None,
            session_secret: SessionSecret::new(session_secret),
        }
    }

    pub fn with_session_secret(mut self, session_secret: &[u8]) -> Self {
        self.session_secret = SessionSecret::new(session_secret);
        self
    }

    pub fn with_nonce_ttl(mut self, nonce_ttl: Duration) -> Self {
        self.nonce_ttl = nonce_ttl;
        self
    }

    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    pub fn with_secure_cookies(mut self, secure_cookies: bool) -> Self {
        self.secure_cookies = secure_cookies;
        self
    }

    pub fn with_expected_domain(mut self, domain: impl Into<String>) -> Self {
        self.expected_domain = Some(domain.into());
        self
    }

    /// Validates the configuration and returns any warnings.
    ///
    /// # Returns
    ///
    /// A vector of warning messages for potentially problematic settings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.nonce_ttl.as_secs() < 30 {
            warnings.push(
                "Very short nonce TTL (< 30 seconds) may expire before the wallet prompt is answered"
                    .to_string(),
            );
        }
        if self.nonce_ttl.as_secs() > 3600 {
            warnings.push("Long nonce TTL (> 1 hour) widens the replay window".to_string());
        }

        if self.session_ttl.as_secs() < 60 {
            warnings.push("Very short session TTL (< 1 minute) forces constant re-login".to_string());
        }
        if self.session_ttl.as_secs() > 30 * 24 * 60 * 60 {
            warnings.push(
                "Long session TTL (> 30 days) keeps stolen tokens usable for a long time"
                    .to_string(),
            );
        }

        if self.session_secret.len() < MIN_SECRET_LEN {
            warnings.push(format!(
                "Session secret is shorter than {MIN_SECRET_LEN} bytes"
            ));
        }

        if self.cookie_name.is_empty() {
            warnings.push("Cookie name is empty".to_string());
        }

        if !self.secure_cookies {
            warnings.push(
                "Session cookies are sent without the Secure attribute; use only for local deployments"
                    .to_string(),
            );
        }

        warnings
    }

    /// Returns a summary of the current configuration. The secret is omitted.
    pub fn summary(&self) -> String {
        format!(
            "AuthConfig {{ Nonce TTL: {}s, Session TTL: {}s, Cookie: {}, Secure: {}, Domain: {} }}",
            self.nonce_ttl.as_secs(),
            self.session_ttl.as_secs(),
            self.cookie_name,
            self.secure_cookies,
            self.expected_domain.as_deref().unwrap_or("<any>"),
        )
    }

    fn from_env() -> Self {
        let nonce_ttl = env_secs(ENV_NONCE_TTL).unwrap_or(DEFAULT_NONCE_TTL_SECS);
        let session_ttl = env_secs(ENV_SESSION_TTL).unwrap_or(DEFAULT_SESSION_TTL_SECS);
        let cookie_name = std::env::var(ENV_COOKIE_NAME)
            .ok()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());
        let secure_cookies = std::env::var(ENV_DEPLOYMENT)
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let expected_domain = std::env::var(ENV_DOMAIN).ok().filter(|d| !d.is_empty());

        Self {
            nonce_ttl: Duration::from_secs(nonce_ttl),
            session_ttl: Duration::from_secs(session_ttl),
            cookie_name,
            secure_cookies,
            expected_domain,
            session_secret: secret_from_env(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::from(ConfigPreset::FromEnv)
    }
}

impl From<ConfigPreset> for AuthConfig {
    fn from(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Production => Self {
                session_secret: secret_from_env(),
                ..Self::new(&[])
            },
            ConfigPreset::Development => Self {
                nonce_ttl: Duration::from_secs(600),
                session_ttl: Duration::from_secs(24 * 60 * 60),
                secure_cookies: false,
                session_secret: secret_from_env(),
                ..Self::new(&[])
            },
            ConfigPreset::FromEnv => Self::from_env(),
        }
    }
}

fn env_secs(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn secret_from_env() -> SessionSecret {
    match std::env::var(ENV_SESSION_SECRET) {
        Ok(secret) if !secret.is_empty() => SessionSecret::new(secret.as_bytes()),
        _ => {
            tracing::warn!(
                "{} is not set; using a random session secret, sessions will not survive a restart",
                ENV_SESSION_SECRET
            );
            SessionSecret::random()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env_vars() {
        unsafe {
            std::env::remove_var(ENV_NONCE_TTL);
            std::env::remove_var(ENV_SESSION_TTL);
            std::env::remove_var(ENV_COOKIE_NAME);
            std::env::remove_var(ENV_DEPLOYMENT);
            std::env::remove_var(ENV_DOMAIN);
            std::env::remove_var(ENV_SESSION_SECRET);
        }
    }

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_new_uses_production_defaults() {
        let config = AuthConfig::new(SECRET);
        assert_eq!(config.nonce_ttl.as_secs(), 120);
        assert_eq!(config.session_ttl.as_secs(), 604_800);
        assert_eq!(config.cookie_name, "access_token");
        assert!(config.secure_cookies);
        assert!(config.expected_domain.is_none());
        assert_eq!(config.session_secret.as_bytes(), SECRET);
    }

    #[test]
    #[serial]
    fn test_development_preset() {
        clear_env_vars();
        let config = AuthConfig::from(ConfigPreset::Development);
        assert_eq!(config.nonce_ttl.as_secs(), 600);
        assert_eq!(config.session_ttl.as_secs(), 86_400);
        assert!(!config.secure_cookies);
        // No secret configured, so a random one is generated
        assert_eq!(config.session_secret.len(), 32);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env_vars();

        unsafe {
            std::env::set_var(ENV_NONCE_TTL, "90");
            std::env::set_var(ENV_SESSION_TTL, "3600");
            std::env::set_var(ENV_COOKIE_NAME, "siwe_session");
            std::env::set_var(ENV_DEPLOYMENT, "production");
            std::env::set_var(ENV_DOMAIN, "app.example.com");
            std::env::set_var(ENV_SESSION_SECRET, "env-provided-secret");
        }

        let config = AuthConfig::from(ConfigPreset::FromEnv);
        assert_eq!(config.nonce_ttl.as_secs(), 90);
        assert_eq!(config.session_ttl.as_secs(), 3600);
        assert_eq!(config.cookie_name, "siwe_session");
        assert!(config.secure_cookies);
        assert_eq!(config.expected_domain.as_deref(), Some("app.example.com"));
        assert_eq!(config.session_secret.as_bytes(), b"env-provided-secret");

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_to_local_deployment() {
        clear_env_vars();
        let config = AuthConfig::default();
        assert_eq!(config.nonce_ttl.as_secs(), 120);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_validation_valid_config() {
        let config = AuthConfig::new(SECRET);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validation_warnings() {
        let config = AuthConfig::new(b"short")
            .with_nonce_ttl(Duration::from_secs(5))
            .with_session_ttl(Duration::from_secs(90 * 24 * 60 * 60))
            .with_secure_cookies(false);
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("Very short nonce TTL")));
        assert!(warnings.iter().any(|w| w.contains("Long session TTL")));
        assert!(warnings.iter().any(|w| w.contains("shorter than 32 bytes")));
        assert!(warnings.iter().any(|w| w.contains("Secure attribute")));
    }

    #[test]
    fn test_summary_and_debug_hide_secret() {
        let config = AuthConfig::new(b"super-secret-value-that-is-long!");
        assert!(!config.summary().contains("super-secret"));
        assert!(!format!("{config:?}").contains("super-secret"));
        assert!(config.summary().contains("Nonce TTL: 120s"));
    }
}
