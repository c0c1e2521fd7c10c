// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity resolution middleware.
//!
//! Behind IAP the caller comes from the signed proxy assertion. In development
//! sign-in mode it comes from the session cookie. Each mode ignores the other's
//! credentials.

use crate::error::AppError;
use crate::identity::{Identity, IdentitySource};
use crate::services::iap::{IapError, IapVerifier, IAP_ASSERTION_HEADER};
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "runtracker_session";

/// Session lifetime in seconds (30 days).
pub const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Middleware that attaches an [`Identity`] to the request when the caller
/// presents valid credentials. Missing or bad credentials leave the request
/// anonymous.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match &state.identity {
        IdentitySource::Iap(verifier) => match iap_identity(verifier, request.headers()).await {
            Ok(identity) => identity,
            Err(e) => return e.into_response(),
        },
        IdentitySource::DevLogin { jwt_signing_key } => session_identity(&jar, jwt_signing_key),
    };

    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

async fn iap_identity(
    verifier: &IapVerifier,
    headers: &HeaderMap,
) -> Result<Option<Identity>, AppError> {
    let Some(assertion) = headers
        .get(IAP_ASSERTION_HEADER)
        .and_then(|h| h.to_str().ok())
    else {
        tracing::debug!("Request carries no IAP assertion");
        return Ok(None);
    };

    match verifier.verify_assertion(assertion).await {
        Ok(identity) => Ok(Some(identity)),
        Err(IapError::Rejected(reason)) => {
            tracing::warn!(reason = %reason, "Ignoring invalid IAP assertion");
            Ok(None)
        }
        Err(e @ IapError::Transient(_)) => Err(AppError::Internal(e.into())),
    }
}

fn session_identity(jar: &CookieJar, signing_key: &[u8]) -> Option<Identity> {
    let cookie = jar.get(SESSION_COOKIE)?;
    decode_jwt(cookie.value(), signing_key)
        .map_err(|e| tracing::debug!(error = %e, "Ignoring invalid session cookie"))
        .ok()
}

/// Middleware that rejects anonymous requests. Must run after
/// [`resolve_identity`].
pub async fn require_identity(request: Request, next: Next) -> Response {
    if request.extensions().get::<Identity>().is_none() {
        return AppError::Unauthorized.into_response();
    }
    next.run(request).await
}

/// Extractor for the identity attached by [`resolve_identity`], if any.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}

/// Create a JWT for a user session.
pub fn create_jwt(email: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: email.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Validate a session JWT and return the identity it names.
pub fn decode_jwt(token: &str, signing_key: &[u8]) -> anyhow::Result<Identity> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation)?;
    if token_data.claims.sub.trim().is_empty() {
        anyhow::bail!("Session token has empty subject");
    }

    Ok(Identity::new(&token_data.claims.sub))
}
