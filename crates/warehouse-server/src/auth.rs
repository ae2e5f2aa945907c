//! Bearer-token authentication.
//!
//! Tokens are JWTs issued by the authentication service. They are verified
//! locally against its public key (RS256) or a shared secret (HS256).

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use warehouse_types::Claims;

use crate::error::ServerError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Verifier
// ─────────────────────────────────────────────────────────────────────────────

/// Verifies caller tokens and extracts their claims.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Verify RS256 tokens with a PEM-encoded RSA public key.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, ServerError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| ServerError::Config(format!("invalid public key: {}", e)))?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    /// Verify HS256 tokens with a shared secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        // `exp` is checked when present but not demanded; audiences vary by issuer.
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        Self { key, validation }
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            })
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Error
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication error.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No token in the query or the authorization header.
    MissingToken,
    /// Authorization header present but not a bearer token.
    InvalidFormat,
    /// Token signature or expiry check failed.
    InvalidToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing authorization token"),
            AuthError::InvalidFormat => write!(f, "Invalid authorization format"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServerError::Unauthorized(self.to_string()).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Caller
// ─────────────────────────────────────────────────────────────────────────────

/// The verified caller, inserted into request extensions by the middleware.
#[derive(Debug, Clone)]
pub struct Caller {
    /// Verified claims.
    pub claims: Claims,
    /// The raw token, forwarded where a call must run as the caller.
    pub token: String,
}

impl Caller {
    /// Caller's user id (`sub`).
    pub fn id(&self) -> &str {
        &self.claims.sub
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Require `Authorization: Bearer <token>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&request)?.ok_or(AuthError::MissingToken)?;
    let caller = authenticate(&state, token)?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

#[derive(Deserialize)]
struct AccessTokenQuery {
    at: Option<String>,
}

/// Like [`auth_middleware`], but an `?at=` query parameter wins over the header.
///
/// Download links are opened directly by browsers, which cannot set headers.
pub async fn download_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let from_query = Query::<AccessTokenQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(q)| q.at)
        .filter(|at| !at.is_empty());

    let token = match from_query {
        Some(token) => token,
        None => bearer_token(&request)?.ok_or(AuthError::MissingToken)?,
    };
    let caller = authenticate(&state, token)?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request<Body>) -> Result<Option<String>, AuthError> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| AuthError::InvalidFormat)?;
    value
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim().to_string()))
        .ok_or(AuthError::InvalidFormat)
}

fn authenticate(state: &AppState, token: String) -> Result<Caller, AuthError> {
    let claims = state.verifier.verify(&token)?;
    tracing::debug!(sub = %claims.sub, "Authenticated caller");
    Ok(Caller { claims, token })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
