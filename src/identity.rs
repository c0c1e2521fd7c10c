// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in user identity and login/logout URL helpers.

use crate::config::IdentityProvider;
use crate::services::iap::IapVerifier;

/// Authenticated user, resolved from an IAP assertion or a session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Lowercased email address
    pub email: String,
}

impl Identity {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.trim().to_lowercase(),
        }
    }

    /// Display name: the part of the email before `@`.
    pub fn nickname(&self) -> &str {
        self.email
            .split_once('@')
            .map(|(local, _)| local)
            .filter(|local| !local.is_empty())
            .unwrap_or(&self.email)
    }

    /// Key for this user's cached run list.
    pub fn cache_key(&self) -> &str {
        &self.email
    }
}

/// Where requests get their [`Identity`] from at runtime.
pub enum IdentitySource {
    /// Verified Identity-Aware Proxy assertions
    Iap(IapVerifier),
    /// Development sign-in form with an HS256 session cookie
    DevLogin { jwt_signing_key: Vec<u8> },
}

/// IAP endpoint that drops the proxy's session and forces a new sign-in.
pub const IAP_CLEAR_LOGIN_PATH: &str = "/_gcp_iap/clear_login_cookie";

impl IdentitySource {
    pub fn from_config(provider: &IdentityProvider) -> anyhow::Result<Self> {
        Ok(match provider {
            IdentityProvider::Iap { audience } => Self::Iap(IapVerifier::new(audience)?),
            IdentityProvider::DevLogin { jwt_signing_key } => {
                tracing::warn!("Development sign-in is enabled; any email can sign in");
                Self::DevLogin {
                    jwt_signing_key: jwt_signing_key.clone(),
                }
            }
        })
    }

    pub fn dev_login_enabled(&self) -> bool {
        matches!(self, Self::DevLogin { .. })
    }

    /// URL that signs the user in and then returns to `return_path`.
    ///
    /// Behind IAP every request is already signed in, so the target itself
    /// sends the browser through the proxy's login.
    pub fn login_url(&self, return_path: &str) -> String {
        let return_path = safe_return_path(Some(return_path));
        match self {
            Self::Iap(_) => return_path.to_string(),
            Self::DevLogin { .. } => format!(
                "/auth/login?continue={}",
                urlencoding::encode(return_path)
            ),
        }
    }

    /// URL that signs the user out and then returns to `return_path`.
    pub fn logout_url(&self, return_path: &str) -> String {
        let return_path = safe_return_path(Some(return_path));
        match self {
            Self::Iap(_) => IAP_CLEAR_LOGIN_PATH.to_string(),
            Self::DevLogin { .. } => format!(
                "/auth/logout?continue={}",
                urlencoding::encode(return_path)
            ),
        }
    }
}

/// Only local absolute paths are accepted as redirect targets; anything else
/// (absent, relative, scheme-relative, absolute URL) becomes `/`.
pub fn safe_return_path(path: Option<&str>) -> &str {
    match path {
        Some(p) if p.starts_with('/') && !p.starts_with("//") && !p.contains('\\') => p,
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_normalizes_email() {
        let identity = Identity::new("  Jane.Doe@Example.COM ");
        assert_eq!(identity.email, "jane.doe@example.com");
        assert_eq!(identity.nickname(), "jane.doe");
        assert_eq!(identity.cache_key(), "jane.doe@example.com");
    }

    #[test]
    fn test_nickname_without_local_part() {
        assert_eq!(Identity::new("@example.com").nickname(), "@example.com");
        assert_eq!(Identity::new("plain").nickname(), "plain");
    }

    fn dev_login() -> IdentitySource {
        IdentitySource::DevLogin {
            jwt_signing_key: b"key".to_vec(),
        }
    }

    fn iap() -> IdentitySource {
        let public_key = include_bytes!("../tests/fixtures/iap_test_key.pub.pem");
        IdentitySource::Iap(
            IapVerifier::new_with_static_key(
                "/projects/1/global/backendServices/2",
                "kid",
                jsonwebtoken::DecodingKey::from_ec_pem(public_key).unwrap(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_dev_login_urls() {
        let source = dev_login();
        assert!(source.dev_login_enabled());
        assert_eq!(source.login_url("/"), "/auth/login?continue=%2F");
        assert_eq!(source.logout_url("/"), "/auth/logout?continue=%2F");
        assert_eq!(
            source.login_url("https://evil.example.com"),
            "/auth/login?continue=%2F"
        );
    }

    #[test]
    fn test_iap_urls() {
        let source = iap();
        assert!(!source.dev_login_enabled());
        assert_eq!(source.login_url("/"), "/");
        assert_eq!(source.login_url("//evil.example.com"), "/");
        assert_eq!(source.logout_url("/"), IAP_CLEAR_LOGIN_PATH);
    }

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/runs?x=1")), "/runs?x=1");
        assert_eq!(safe_return_path(Some("//evil.example.com")), "/");
        assert_eq!(safe_return_path(Some("/\\evil.example.com")), "/");
        assert_eq!(safe_return_path(Some("relative")), "/");
        assert_eq!(safe_return_path(None), "/");
    }
}
