// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use runtracker::cache::RunCache;
use runtracker::config::{Config, IdentityProvider};
use runtracker::db::Datastore;
use runtracker::identity::IdentitySource;
use runtracker::middleware::auth::{create_jwt, SESSION_COOKIE};
use runtracker::routes::create_router;
use runtracker::services::iap::IapVerifier;
use runtracker::services::RunLog;
use runtracker::AppState;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Expected `aud` of IAP assertions in tests.
#[allow(dead_code)]
pub const IAP_AUDIENCE: &str = "/projects/123/global/backendServices/456";
const IAP_KID: &str = "test-kid";
const IAP_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/iap_test_key.pem");
const IAP_PUBLIC_KEY: &[u8] = include_bytes!("../fixtures/iap_test_key.pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Router plus handles on the pieces behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Datastore,
    pub cache: RunCache,
}

/// Create a test app backed by the in-memory datastore.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

/// Create a test app whose cache is disabled and refuses every write.
#[allow(dead_code)]
pub fn create_test_app_with_disabled_cache() -> TestApp {
    create_test_app_with_config(Config {
        cache_max_entries: 0,
        ..Config::test_default()
    })
}

/// Create a test app identified by IAP assertions signed with the test key.
#[allow(dead_code)]
pub fn create_test_app_with_iap() -> TestApp {
    create_test_app_with_config(Config {
        identity: IdentityProvider::Iap {
            audience: IAP_AUDIENCE.to_string(),
        },
        ..Config::test_default()
    })
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let db = Datastore::in_memory();
    let cache = RunCache::new(config.cache_max_entries);

    let identity = match &config.identity {
        IdentityProvider::Iap { audience } => IdentitySource::Iap(
            IapVerifier::new_with_static_key(
                audience,
                IAP_KID,
                DecodingKey::from_ec_pem(IAP_PUBLIC_KEY).unwrap(),
            )
            .unwrap(),
        ),
        IdentityProvider::DevLogin { jwt_signing_key } => IdentitySource::DevLogin {
            jwt_signing_key: jwt_signing_key.clone(),
        },
    };

    let state = Arc::new(AppState {
        config,
        identity,
        run_log: RunLog::new(db.clone(), cache.clone()),
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        cache,
    }
}

/// Session signing key of [`Config::test_default`].
#[allow(dead_code)]
pub fn test_signing_key() -> Vec<u8> {
    match Config::test_default().identity {
        IdentityProvider::DevLogin { jwt_signing_key } => jwt_signing_key,
        IdentityProvider::Iap { .. } => unreachable!("test config uses dev login"),
    }
}

/// `Cookie` header value carrying a valid session for `email`.
#[allow(dead_code)]
pub fn session_cookie(email: &str) -> String {
    format!(
        "{}={}",
        SESSION_COOKIE,
        create_jwt(email, &test_signing_key()).unwrap()
    )
}

/// IAP assertion for `email`, signed with the test key.
#[allow(dead_code)]
pub fn iap_assertion(email: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = serde_json::json!({
        "iss": "https://cloud.google.com/iap",
        "aud": IAP_AUDIENCE,
        "sub": "accounts.google.com:1234567890",
        "email": email,
        "iat": now,
        "exp": now + 600,
    });

    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(IAP_KID.to_string());
    jsonwebtoken::encode(
        &header,
        &claims,
        &EncodingKey::from_ec_pem(IAP_PRIVATE_KEY).unwrap(),
    )
    .unwrap()
}

/// GET `uri`, optionally signed in.
#[allow(dead_code)]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// POST a urlencoded form to `uri`, optionally signed in.
#[allow(dead_code)]
pub fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

/// Collect a response body as UTF-8 text.
#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
