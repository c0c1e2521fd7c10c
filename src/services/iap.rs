// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity-Aware Proxy assertion verification.
//!
//! IAP signs every request it forwards with an ES256 JWT in the
//! `x-goog-iap-jwt-assertion` header. The plain `x-goog-authenticated-user-*`
//! headers are never trusted; only a verified assertion yields an identity.

use crate::identity::Identity;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

/// Header carrying the signed IAP assertion.
pub const IAP_ASSERTION_HEADER: &str = "x-goog-iap-jwt-assertion";

const IAP_ISSUER: &str = "https://cloud.google.com/iap";
const IAP_JWKS_URL: &str = "https://www.gstatic.com/iap/verify/public_key-jwk";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Assertion verification failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IapError {
    /// The assertion is invalid or its claims do not match.
    #[error("IAP assertion rejected: {0}")]
    Rejected(String),
    /// Signing keys could not be fetched.
    #[error("IAP key fetch failed: {0}")]
    Transient(String),
}

enum KeySource {
    Google,
    Static {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for IAP-signed request assertions.
pub struct IapVerifier {
    http_client: reqwest::Client,
    expected_audience: String,
    keys: KeySource,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl IapVerifier {
    /// Create a verifier that fetches and caches Google's IAP signing keys.
    pub fn new(audience: &str) -> anyhow::Result<Self> {
        tracing::info!(expected_audience = %audience, "Initialized IAP assertion verifier");
        Self::with_keys(audience, KeySource::Google)
    }

    /// Create a verifier that trusts a single ES256 public key.
    ///
    /// Used by tests, which sign their own assertions.
    pub fn new_with_static_key(
        audience: &str,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static IAP kid must not be empty");
        }

        Self::with_keys(
            audience,
            KeySource::Static {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
        )
    }

    fn with_keys(audience: &str, keys: KeySource) -> anyhow::Result<Self> {
        if audience.trim().is_empty() {
            anyhow::bail!("IAP audience must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building IAP HTTP client")?;

        Ok(Self {
            http_client,
            expected_audience: audience.trim().to_string(),
            keys,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify an assertion and return the identity it names.
    pub async fn verify_assertion(&self, token: &str) -> Result<Identity, IapError> {
        let header = decode_header(token)
            .map_err(|e| IapError::Rejected(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::ES256 {
            return Err(IapError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| IapError::Rejected("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::ES256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[IAP_ISSUER]);
        validation.set_audience(&[self.expected_audience.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<IapClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| IapError::Rejected(format!("JWT validation failed: {e}")))?
            .claims;

        validate_iat(claims.iat)?;

        let email = claims
            .email
            .filter(|email| email.contains('@'))
            .ok_or_else(|| IapError::Rejected("missing email claim".to_string()))?;

        tracing::debug!(subject = %claims.sub, "IAP assertion verified");
        Ok(Identity::new(&email))
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, IapError> {
        if let KeySource::Static {
            kid: static_kid,
            decoding_key,
        } = &self.keys
        {
            if kid == static_kid {
                return Ok(decoding_key.clone());
            }
            return Err(IapError::Rejected(format!(
                "unknown JWT kid for static verifier: {kid}"
            )));
        }

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // Keys rotate, so an unknown kid forces one refetch
        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(IapError::Rejected(format!(
            "JWT kid not found in IAP keys after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), IapError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_uri = IAP_JWKS_URL, "Refreshing IAP key cache");

        let response = self
            .http_client
            .get(IAP_JWKS_URL)
            .send()
            .await
            .map_err(|e| IapError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IapError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| IapError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(IapError::Transient(
                "JWKS response did not include any usable EC keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "IAP key cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    crv: Option<String>,
    #[serde(default)]
    x: String,
    #[serde(default)]
    y: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IapClaims {
    sub: String,
    iat: Option<usize>,
    email: Option<String>,
}

/// P-256 signing keys from a JWKS document, by key ID.
fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "EC" || jwk.kid.trim().is_empty() {
            continue;
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "ES256")
            || jwk.crv.as_deref().is_some_and(|crv| crv != "P-256")
            || jwk.use_.as_deref().is_some_and(|use_| use_ != "sig")
        {
            continue;
        }

        match DecodingKey::from_ec_components(&jwk.x, &jwk.y) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid EC JWKS key");
            }
        }
    }

    keys_by_kid
}

fn validate_iat(iat: Option<usize>) -> Result<(), IapError> {
    let Some(iat) = iat else {
        return Err(IapError::Rejected("missing iat claim".to_string()));
    };

    if iat as u64 > now_unix_secs() + CLOCK_SKEW_SECS {
        return Err(IapError::Rejected("iat claim is in the future".to_string()));
    }

    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value.split(',').find_map(|directive| {
        directive
            .trim()
            .strip_prefix("max-age=")
            .and_then(|raw| raw.trim_matches('"').parse::<u64>().ok())
    })
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const AUDIENCE: &str = "/projects/123/global/backendServices/456";
    const KID: &str = "test-kid";
    const PRIVATE_KEY: &[u8] = include_bytes!("../../tests/fixtures/iap_test_key.pem");
    const PUBLIC_KEY: &[u8] = include_bytes!("../../tests/fixtures/iap_test_key.pub.pem");

    fn verifier() -> IapVerifier {
        IapVerifier::new_with_static_key(
            AUDIENCE,
            KID,
            DecodingKey::from_ec_pem(PUBLIC_KEY).unwrap(),
        )
        .unwrap()
    }

    fn sign(claims: serde_json::Value, kid: &str) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(kid.to_string());
        encode(
            &header,
            &claims,
            &EncodingKey::from_ec_pem(PRIVATE_KEY).unwrap(),
        )
        .unwrap()
    }

    fn claims(email: &str, audience: &str) -> serde_json::Value {
        let now = now_unix_secs();
        json!({
            "iss": IAP_ISSUER,
            "aud": audience,
            "sub": "accounts.google.com:1234567890",
            "email": email,
            "iat": now,
            "exp": now + 600,
        })
    }

    #[tokio::test]
    async fn test_valid_assertion_yields_identity() {
        let token = sign(claims("Jane@Example.com", AUDIENCE), KID);
        let identity = verifier().verify_assertion(&token).await.unwrap();
        assert_eq!(identity, Identity::new("jane@example.com"));
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let token = sign(claims("jane@example.com", "/projects/9/other"), KID);
        assert!(matches!(
            verifier().verify_assertion(&token).await,
            Err(IapError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_kid_rejected() {
        let token = sign(claims("jane@example.com", AUDIENCE), "other-kid");
        assert!(matches!(
            verifier().verify_assertion(&token).await,
            Err(IapError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_assertion_rejected() {
        let mut expired = claims("jane@example.com", AUDIENCE);
        expired["exp"] = json!(now_unix_secs() - 3600);
        let token = sign(expired, KID);
        assert!(matches!(
            verifier().verify_assertion(&token).await,
            Err(IapError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_hmac_signed_assertion_rejected() {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(KID.to_string());
        let token = encode(
            &header,
            &claims("jane@example.com", AUDIENCE),
            &EncodingKey::from_secret(b"guessable"),
        )
        .unwrap();

        assert!(matches!(
            verifier().verify_assertion(&token).await,
            Err(IapError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_email_rejected() {
        let mut no_email = claims("jane@example.com", AUDIENCE);
        no_email.as_object_mut().unwrap().remove("email");
        let token = sign(no_email, KID);
        assert!(matches!(
            verifier().verify_assertion(&token).await,
            Err(IapError::Rejected(_))
        ));
    }

    #[test]
    fn test_usable_keys_filters_non_p256() {
        let jwks: Jwks = serde_json::from_value(json!({
            "keys": [
                {"kid": "rsa", "kty": "RSA", "alg": "RS256", "n": "abc", "e": "AQAB"},
                {"kid": "p384", "kty": "EC", "alg": "ES384", "crv": "P-384", "x": "a", "y": "b"},
            ]
        }))
        .unwrap();
        assert!(usable_keys(jwks).is_empty());
    }

    #[test]
    fn test_parse_cache_control_max_age() {
        assert_eq!(parse_cache_control_max_age("public, max-age=3600"), Some(3600));
        assert_eq!(parse_cache_control_max_age("max-age=\"120\""), Some(120));
        assert_eq!(parse_cache_control_max_age("public, immutable"), None);
        assert_eq!(parse_cache_control_max_age("max-age=abc"), None);
    }
}
