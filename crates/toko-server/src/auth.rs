use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use toko_core::{Account, AppError, RateLimitDecision};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims carried by bearer tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for `account`, valid for the configured TTL.
    pub fn issue(&self, account: &Account) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Generic(format!("Failed to sign token: {e}")))
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))
    }
}

/// Middleware that validates `Authorization: Bearer <jwt>` and stores the
/// decoded [`Claims`] in the request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return ApiError(AppError::Unauthorized(
            "Missing or invalid Authorization header. Expected: Bearer <token>".to_string(),
        ))
        .into_response();
    };

    match state.jwt.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "Rejected bearer token");
            ApiError(err).into_response()
        }
    }
}

/// Middleware in front of the login handler. Every attempt counts against
/// the client's window; a successful login gives back its own attempt but
/// leaves earlier failures counted.
pub async fn login_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer, state.trust_proxy);

    match state.login_limiter.check_and_record(&key, Instant::now()).await {
        RateLimitDecision::Allow => {}
        RateLimitDecision::Deny { retry_after } => {
            tracing::warn!(client = %key, "Login rate limit exceeded");
            let mut response = ApiError(AppError::RateLimited).into_response();
            // Round up so clients never retry early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            return response;
        }
    }

    let response = next.run(request).await;
    if response.status().is_success() {
        state.login_limiter.refund(&key).await;
    }
    response
}

/// Identify the client for rate limiting.
///
/// With `trust_proxy` the last `X-Forwarded-For` entry is used: it is the
/// one appended by the proxy in front of us, while earlier entries are
/// whatever the client sent. Otherwise the peer address is used.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    if trust_proxy
        && let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}
