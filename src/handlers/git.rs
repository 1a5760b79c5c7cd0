use axum::{body::Bytes, extract::State, response::Json};
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

use super::{ApiError, ApiState, RequireAuth};
use crate::git::{self, SyncOptions};
use crate::types::{CommitAuthor, GitStatus, GitSyncResult};

const STATUS_FAILED: &str = "Failed to get git status";
const SYNC_FAILED: &str = "Failed to sync to git";

/// POST /api/git/status - Branch, ahead/behind and changed files of a repository
pub async fn git_status(
    RequireAuth(_user): RequireAuth,
    body: Bytes,
) -> Result<Json<GitStatus>, ApiError> {
    let body = parse_body(&body, STATUS_FAILED)?;
    let repository_path = PathBuf::from(
        required_str(&body, "repositoryPath")
            .ok_or(ApiError::BadRequest("repositoryPath is required"))?,
    );

    let status = tokio::task::spawn_blocking(move || git::get_git_status(&repository_path))
        .await
        .map_err(|e| ApiError::internal(STATUS_FAILED, e))?;

    Ok(Json(status))
}

/// POST /api/git/sync - Stage, commit and optionally push a repository
pub async fn git_sync(
    State(state): State<ApiState>,
    RequireAuth(user): RequireAuth,
    body: Bytes,
) -> Result<Json<GitSyncResult>, ApiError> {
    let body = parse_body(&body, SYNC_FAILED)?;
    let repository_path = required_str(&body, "repositoryPath")
        .ok_or(ApiError::BadRequest("repositoryPath is required"))?;
    let commit_message = required_str(&body, "commitMessage")
        .ok_or(ApiError::BadRequest("commitMessage is required"))?;
    let opus_id = required_str(&body, "opusId").map(str::to_string);
    let push = is_truthy(body.get("push"));

    let author = CommitAuthor::or_fallback(
        user.name.as_deref(),
        user.email.as_deref(),
        &state.fallback_author,
    );
    let options = SyncOptions::new(repository_path, commit_message, author)
        .with_branch(state.git_branch.clone())
        .with_push(push);

    let result = tokio::task::spawn_blocking(move || git::sync_to_git(&options))
        .await
        .map_err(|e| ApiError::internal(SYNC_FAILED, e))?;

    if result.success
        && let Some(commit_hash) = result.commit_hash.as_deref()
        && let Some(opus_id) = opus_id.as_deref()
    {
        record_sync(&state, opus_id, commit_hash, result.pushed());
    }

    Ok(Json(result))
}

/// Best effort: the sync result is already final, so a failed update is
/// only logged.
fn record_sync(state: &ApiState, opus_id: &str, commit_hash: &str, pushed: bool) {
    let now = Utc::now();
    match state
        .repo
        .record_commit(opus_id, commit_hash, now, pushed.then_some(now))
    {
        Ok(()) => info!("Recorded commit {} on opus {}", commit_hash, opus_id),
        Err(e) => warn!("Failed to update opus {} with commit info: {}", opus_id, e),
    }
}

fn parse_body(body: &Bytes, context: &'static str) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::internal(context, e))
}

/// A present, non-empty string field.
fn required_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Loose boolean coercion: absent, null, false, 0 and "" are false,
/// everything else is true.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_flag_coercion() {
        let body = json!({
            "yes": true,
            "no": false,
            "one": 1,
            "zero": 0,
            "text": "false",
            "empty": "",
            "list": [],
            "nothing": null
        });
        assert!(is_truthy(body.get("yes")));
        assert!(!is_truthy(body.get("no")));
        assert!(is_truthy(body.get("one")));
        assert!(!is_truthy(body.get("zero")));
        assert!(is_truthy(body.get("text")));
        assert!(!is_truthy(body.get("empty")));
        assert!(is_truthy(body.get("list")));
        assert!(!is_truthy(body.get("nothing")));
        assert!(!is_truthy(body.get("missing")));
    }

    #[test]
    fn required_fields_must_be_non_empty_strings() {
        let body = json!({ "a": "x", "b": "", "c": 7 });
        assert_eq!(required_str(&body, "a"), Some("x"));
        assert_eq!(required_str(&body, "b"), None);
        assert_eq!(required_str(&body, "c"), None);
        assert_eq!(required_str(&body, "d"), None);
        assert_eq!(required_str(&json!([1, 2]), "a"), None);
    }
}
