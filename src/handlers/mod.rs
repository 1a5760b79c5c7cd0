pub mod auth;
pub mod error;
pub mod git;
pub mod opus;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::config::Config;
use crate::db::OpusRepo;
use crate::types::CommitAuthor;

pub use auth::{AuthUser, RequireAuth};
pub use error::ApiError;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub repo: Arc<OpusRepo>,
    pub git_branch: String,
    pub fallback_author: CommitAuthor,
}

impl ApiState {
    pub fn new(repo: Arc<OpusRepo>, config: &Config) -> Self {
        Self {
            repo,
            git_branch: config.git_branch.clone(),
            fallback_author: config.fallback_author.clone(),
        }
    }
}

/// Create API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/git/status", post(git::git_status))
        .route("/git/sync", post(git::git_sync))
        .route("/opuses", get(opus::list_opuses))
        .route("/opus-types", get(opus::list_opus_types))
        .with_state(state)
}
