// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Development sign-in and sign-out routes.
//!
//! Signing in only asks for an email address and issues a signed session
//! cookie for it. The router mounts these routes only when the development
//! identity provider is configured.

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::identity::{safe_return_path, Identity, IdentitySource};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::views::render_login;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", get(logout))
}

/// Where to send the user afterwards.
#[derive(Deserialize)]
pub struct ContinueParams {
    #[serde(rename = "continue", default)]
    continue_to: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email)]
    email: String,
    #[serde(rename = "continue", default)]
    continue_to: Option<String>,
}

/// Show the sign-in form.
async fn login_page(Query(params): Query<ContinueParams>) -> Html<String> {
    Html(render_login(safe_return_path(params.continue_to.as_deref())))
}

/// Issue a session cookie for the submitted email.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect)> {
    form.validate()?;

    let IdentitySource::DevLogin { jwt_signing_key } = &state.identity else {
        return Err(AppError::NotFound("Sign-in is not available".to_string()));
    };

    let identity = Identity::new(&form.email);
    let token = create_jwt(&identity.email, jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64));

    tracing::info!(nickname = %identity.nickname(), "User signed in");

    let target = safe_return_path(form.continue_to.as_deref());
    Ok((jar.add(cookie), Redirect::to(target)))
}

/// Clear the session cookie.
async fn logout(jar: CookieJar, Query(params): Query<ContinueParams>) -> (CookieJar, Redirect) {
    let target = safe_return_path(params.continue_to.as_deref());
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to(target),
    )
}
