//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets as environment variables, so everything is read
//! from the process environment (plus an optional `.env` file for local dev).

use std::env;
use std::str::FromStr;

/// Which datastore backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatastoreBackend {
    /// Google Cloud Firestore (or the Firestore emulator)
    Firestore,
    /// Process-local maps, for local development and tests
    Memory,
}

impl FromStr for DatastoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                var: "DATASTORE",
                value: other.to_string(),
            }),
        }
    }
}

/// Where caller identities come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityProvider {
    /// Signed assertions from Identity-Aware Proxy in front of the service.
    /// `audience` is the expected `aud` claim, e.g.
    /// `/projects/123/global/backendServices/456`.
    Iap { audience: String },
    /// Email-only sign-in form issuing a session cookie. It signs in any
    /// address typed into it, so it is for local development only.
    DevLogin { jwt_signing_key: Vec<u8> },
}

impl IdentityProvider {
    /// Build from the raw `IDENTITY_PROVIDER`, `IAP_AUDIENCE` and
    /// `JWT_SIGNING_KEY` values. The provider defaults to IAP.
    pub fn from_vars(
        provider: Option<&str>,
        iap_audience: Option<&str>,
        jwt_signing_key: Option<&str>,
    ) -> Result<Self, ConfigError> {
        fn non_empty(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        match provider
            .map(|p| p.trim().to_ascii_lowercase())
            .as_deref()
            .unwrap_or("iap")
        {
            "iap" => Ok(Self::Iap {
                audience: non_empty(iap_audience)
                    .ok_or(ConfigError::Missing("IAP_AUDIENCE"))?
                    .to_string(),
            }),
            "dev-login" => Ok(Self::DevLogin {
                jwt_signing_key: non_empty(jwt_signing_key)
                    .ok_or(ConfigError::Missing("JWT_SIGNING_KEY"))?
                    .as_bytes()
                    .to_vec(),
            }),
            other => Err(ConfigError::Invalid {
                var: "IDENTITY_PROVIDER",
                value: other.to_string(),
            }),
        }
    }

    /// Whether the development sign-in form is enabled.
    pub fn dev_login_enabled(&self) -> bool {
        matches!(self, Self::DevLogin { .. })
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Datastore backend
    pub datastore: DatastoreBackend,
    /// Public base URL; decides whether session cookies are `Secure`
    pub public_url: String,
    /// Upper bound on cached run lists; 0 disables the cache
    pub cache_max_entries: usize,
    /// Identity source
    pub identity: IdentityProvider,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            datastore: env::var("DATASTORE")
                .unwrap_or_else(|_| "firestore".to_string())
                .parse()?,
            public_url: env::var("PUBLIC_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .unwrap_or(10_000),
            identity: IdentityProvider::from_vars(
                env::var("IDENTITY_PROVIDER").ok().as_deref(),
                env::var("IAP_AUDIENCE").ok().as_deref(),
                env::var("JWT_SIGNING_KEY").ok().as_deref(),
            )?,
        })
    }

    /// Default config for tests: in-memory datastore, plain-http cookies,
    /// development sign-in.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            gcp_project_id: "test-project".to_string(),
            datastore: DatastoreBackend::Memory,
            public_url: "http://localhost:8080".to_string(),
            cache_max_entries: 100,
            identity: IdentityProvider::DevLogin {
                jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            },
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}
