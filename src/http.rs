//! REST surface over [`AuthCore`], with the session carried in a cookie.
//!
//! Routes, relative to [`HttpConfig::prefix`]:
//!
//! | Route | Request | Response |
//! |---|---|---|
//! | `GET /auth/nonce?address=0x..` | query | `{"nonce"}` |
//! | `POST /auth/verify` | `{"message", "signature"}` | `{"address"}` and `Set-Cookie` |
//! | `POST /auth/logout` | | `{"message"}` and a removal cookie |
//! | `GET /auth/me` | session cookie | `{"address", "iat", "exp"}` |
//!
//! Failures are answered with `{"statusCode", "message"}`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite as CookieSameSite};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::CorsLayer;

use crate::auth::{
    AuthCore, AuthError, CookieAttributes, CredentialStore, NonceStore, SameSite, Session,
};

/// Environment variable holding the listen port.
pub const ENV_PORT: &str = "PORT";
/// Environment variable holding the single origin allowed to make
/// credentialed cross-origin requests.
pub const ENV_FRONTEND_URL: &str = "FRONTEND_URL";

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_PREFIX: &str = "/api";

/// Server settings for the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub bind_addr: SocketAddr,
    /// Origin allowed by CORS, with credentials
    pub frontend_origin: String,
    /// Path every route is nested under; empty or `/` for the root
    pub prefix: String,
}

impl HttpConfig {
    /// Reads `PORT` and `FRONTEND_URL`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = std::env::var(ENV_PORT)
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let frontend_origin = std::env::var(ENV_FRONTEND_URL)
            .ok()
            .filter(|origin| !origin.is_empty())
            .unwrap_or(defaults.frontend_origin);

        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            frontend_origin,
            prefix: defaults.prefix,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// CORS for the configured frontend, credentials allowed.
    ///
    /// An origin that is not a valid header value disables cross-origin
    /// access altogether.
    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true);

        match self.frontend_origin.parse::<HeaderValue>() {
            Ok(origin) => layer.allow_origin(origin),
            Err(e) => {
                tracing::warn!(
                    origin = %self.frontend_origin,
                    "Invalid frontend origin, cross-origin requests disabled: {}",
                    e
                );
                layer
            }
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            frontend_origin: DEFAULT_FRONTEND_URL.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Errors returned by the HTTP handlers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Internal(reason) => {
                tracing::error!(error = %reason, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %self, "Client error occurred");
            }
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::BadRequest(_) => {
                ApiError::BadRequest("Invalid SIWE message format.".to_string())
            }
            AuthError::Unauthorized => ApiError::Unauthorized,
            AuthError::Internal(reason) => ApiError::Internal(reason),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// [`CredentialStore`] over the request's cookies.
///
/// Cookies set or cleared through it are emitted as `Set-Cookie` headers when
/// the inner jar is returned from a handler.
#[derive(Debug, Default, Clone)]
pub struct HttpCookieJar {
    jar: CookieJar,
}

impl HttpCookieJar {
    pub fn new(jar: CookieJar) -> Self {
        Self { jar }
    }

    pub fn into_inner(self) -> CookieJar {
        self.jar
    }
}

fn session_cookie(name: &str, value: String, attributes: &CookieAttributes) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_owned(), value);
    cookie.set_http_only(attributes.http_only);
    cookie.set_secure(attributes.secure);
    cookie.set_same_site(match attributes.same_site {
        SameSite::Strict => CookieSameSite::Strict,
        SameSite::Lax => CookieSameSite::Lax,
        SameSite::None => CookieSameSite::None,
    });
    cookie.set_max_age(time::Duration::seconds(attributes.max_age));
    cookie.set_path(attributes.path.clone());
    cookie
}

impl CredentialStore for HttpCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|cookie| cookie.value().to_string())
    }

    fn set(&mut self, name: &str, value: String, attributes: CookieAttributes) {
        let cookie = session_cookie(name, value, &attributes);
        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }

    fn clear(&mut self, name: &str) {
        // Always emit the removal, whether or not the request carried the cookie
        let mut cookie = Cookie::new(name.to_owned(), String::new());
        cookie.set_path("/");
        cookie.make_removal();
        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }
}

#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressResponse {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn nonce<S: NonceStore + 'static>(
    State(core): State<Arc<AuthCore<S>>>,
    Query(query): Query<NonceQuery>,
) -> Result<Json<NonceResponse>, ApiError> {
    let nonce = core.request_nonce(query.address.as_deref()).await?;
    Ok(Json(NonceResponse { nonce }))
}

async fn verify<S: NonceStore + 'static>(
    State(core): State<Arc<AuthCore<S>>>,
    jar: CookieJar,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AddressResponse>), ApiError> {
    let Json(request) = body?;
    let mut jar = HttpCookieJar::new(jar);

    let sign_in = core
        .verify_and_establish(&request.message, &request.signature, &mut jar)
        .await?;

    Ok((
        jar.into_inner(),
        Json(AddressResponse {
            address: sign_in.identity.into_inner(),
        }),
    ))
}

async fn logout<S: NonceStore + 'static>(
    State(core): State<Arc<AuthCore<S>>>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let mut jar = HttpCookieJar::new(jar);
    core.end_session(&mut jar);

    (
        jar.into_inner(),
        Json(MessageResponse {
            message: "Logged out successfully.".to_string(),
        }),
    )
}

async fn me<S: NonceStore + 'static>(
    State(core): State<Arc<AuthCore<S>>>,
    jar: CookieJar,
) -> Result<Json<Session>, ApiError> {
    core.current_session(&HttpCookieJar::new(jar))
        .map(Json)
        .ok_or(ApiError::Unauthorized)
}

/// Builds the router: auth routes nested under the configured prefix, with
/// CORS for the configured frontend.
pub fn router<S: NonceStore + 'static>(core: Arc<AuthCore<S>>, config: &HttpConfig) -> Router {
    let routes = Router::new()
        .route("/auth/nonce", get(nonce::<S>))
        .route("/auth/verify", post(verify::<S>))
        .route("/auth/logout", post(logout::<S>))
        .route("/auth/me", get(me::<S>))
        .with_state(core);

    let prefix = config.prefix.trim_matches('/');
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&format!("/{prefix}"), routes)
    };

    app.layer(config.cors_layer())
}

/// Serves the router on `config.bind_addr` until Ctrl+C or SIGTERM.
pub async fn serve<S: NonceStore + 'static>(
    core: Arc<AuthCore<S>>,
    config: HttpConfig,
) -> std::io::Result<()> {
    let app = router(core, &config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    tracing::info!(
        "Listening on http://{}{}",
        listener.local_addr()?,
        config.prefix
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
