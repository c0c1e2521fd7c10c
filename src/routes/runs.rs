// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run log pages: list, add, remove.

use crate::error::Result;
use crate::identity::Identity;
use crate::middleware::auth::MaybeIdentity;
use crate::models::NewRun;
use crate::services::avatar::{gravatar, DEFAULT_RATING, DEFAULT_SIZE};
use crate::views::{render_index, IndexPage};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Extension, Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Main page, open to anonymous visitors.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(main_page))
}

/// Routes that change data; the caller must be signed in.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/addRun", post(add_run))
        .route("/removeRun", get(remove_run))
}

/// Render the run list for the signed-in user, or a login link.
///
/// A user without a runner record sees no runs; the record is only created
/// when they add their first run.
async fn main_page(
    State(state): State<Arc<AppState>>,
    MaybeIdentity(identity): MaybeIdentity,
) -> Result<Html<String>> {
    let page = match identity {
        Some(identity) => {
            let runs = match state.run_log.get_runner(&identity).await? {
                Some(_) => Some(state.run_log.get_runs(&identity).await?),
                None => None,
            };

            tracing::debug!(
                runs = runs.as_ref().map(Vec::len),
                "Rendering run list"
            );

            IndexPage {
                runner: Some(identity.nickname().to_string()),
                avatar: Some(gravatar(
                    &identity.email,
                    DEFAULT_SIZE,
                    DEFAULT_RATING,
                    "",
                )),
                runs,
                url: state.identity.logout_url("/"),
                url_linktext: "Logout".to_string(),
            }
        }
        None => IndexPage {
            url: state.identity.login_url("/"),
            url_linktext: "Login".to_string(),
            ..Default::default()
        },
    };

    Ok(Html(render_index(&page)))
}

/// Add a run, creating the runner record on first use.
async fn add_run(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Form(new_run): Form<NewRun>,
) -> Result<Redirect> {
    new_run.validate()?;

    let runner = state.run_log.ensure_runner(&identity).await?;
    state.run_log.put_run(&identity, &runner, new_run).await?;

    Ok(Redirect::to("/"))
}

#[derive(Deserialize)]
struct RemoveRunParams {
    key: String,
}

/// Remove one run by key.
async fn remove_run(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<RemoveRunParams>,
) -> Result<Redirect> {
    state.run_log.remove_run(&identity, &params.key).await?;
    Ok(Redirect::to("/"))
}
