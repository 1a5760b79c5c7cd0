use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use git2::{Repository, RepositoryInitOptions};
use rusqlite::Connection;
use serde_json::{Value, json};
use ssot::{
    config::Config,
    db::{NewOpus, OpusRepo, init_database},
    handlers::{ApiState, api_routes},
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

fn setup() -> (Router, Arc<OpusRepo>, String) {
    let conn = Connection::open_in_memory().expect("in-memory sqlite");
    init_database(&conn).expect("init db");
    let repo = Arc::new(OpusRepo::new(conn));

    let token = repo
        .create_session(
            "user-1",
            Some("Ada Lovelace"),
            None,
            chrono::Utc::now() + chrono::Duration::days(1),
        )
        .unwrap();

    let config = Config::from_lookup(|_| None).unwrap();
    let app = Router::new().nest("/api", api_routes(ApiState::new(repo.clone(), &config)));
    (app, repo, token)
}

fn init_repo(dir: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(dir, &opts).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(body.into()).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn requests_without_a_session_are_rejected() {
    let (app, _repo, _token) = setup();

    let response = app
        .clone()
        .oneshot(post(
            "/api/git/status",
            None,
            json!({ "repositoryPath": "/tmp" }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await, json!({ "error": "Unauthorized" }));

    let response = app
        .oneshot(post(
            "/api/git/sync",
            Some("not-a-session"),
            json!({ "repositoryPath": "/tmp", "commitMessage": "x" }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let (app, _repo, token) = setup();

    let response = app
        .clone()
        .oneshot(post("/api/git/status", Some(&token), "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await,
        json!({ "error": "repositoryPath is required" })
    );

    let response = app
        .clone()
        .oneshot(post(
            "/api/git/sync",
            Some(&token),
            json!({ "repositoryPath": "/tmp/x", "commitMessage": "" }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await,
        json!({ "error": "commitMessage is required" })
    );

    let response = app
        .oneshot(post(
            "/api/git/sync",
            Some(&token),
            json!({ "commitMessage": "hello" }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await,
        json!({ "error": "repositoryPath is required" })
    );
}

#[tokio::test]
async fn malformed_json_is_an_internal_error() {
    let (app, _repo, token) = setup();

    let response = app
        .oneshot(post("/api/git/sync", Some(&token), "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Failed to sync to git");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn status_of_a_plain_directory_reports_failure_in_band() {
    let (app, _repo, token) = setup();
    let dir = TempDir::new().unwrap();

    let response = app
        .oneshot(post(
            "/api/git/status",
            Some(&token),
            json!({ "repositoryPath": dir.path() }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("not a git repository"));
    assert!(body.get("branch").is_none());
}

#[tokio::test]
async fn sync_commits_and_records_the_hash_on_the_opus() {
    let (app, repo, token) = setup();
    let dir = TempDir::new().unwrap();
    let git = init_repo(dir.path());
    std::fs::write(dir.path().join("roadmap.md"), "# Roadmap\n").unwrap();

    let opus = repo
        .create_opus(&NewOpus {
            name: "Roadmap".into(),
            opus_type: "project".into(),
            ..NewOpus::default()
        })
        .unwrap();

    let response = app
        .clone()
        .oneshot(post(
            "/api/git/status",
            Some(&token),
            json!({ "repositoryPath": dir.path() }).to_string(),
        ))
        .await
        .unwrap();
    let status = read_json(response).await;
    assert_eq!(status["success"], true);
    assert_eq!(status["branch"], "main");
    assert_eq!(status["created"], json!([]));
    assert_eq!(status["notAdded"], json!(["roadmap.md"]));

    let response = app
        .clone()
        .oneshot(post(
            "/api/git/sync",
            Some(&token),
            json!({
                "opusId": opus.id,
                "repositoryPath": dir.path(),
                "commitMessage": "Update Roadmap",
                "push": false
            })
            .to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = read_json(response).await;
    assert_eq!(result["success"], true);
    assert!(result.get("pushedToRemote").is_none());
    assert_eq!(result["changes"]["unstaged"], json!(["roadmap.md"]));
    assert_eq!(result["changes"]["untracked"], json!([]));
    let hash = result["commitHash"].as_str().unwrap().to_string();

    let head = git.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.id().to_string(), hash);
    assert_eq!(head.message(), Some("Update Roadmap"));
    assert_eq!(head.author().name(), Some("Ada Lovelace"));
    assert_eq!(head.author().email(), Some("user@ocd.local"));

    let stored = repo.get_opus(&opus.id).unwrap().unwrap();
    assert_eq!(stored.last_commit_hash.as_deref(), Some(hash.as_str()));
    assert!(stored.last_commit_at.is_some());
    assert!(stored.last_push_at.is_none());

    // A second sync finds nothing to commit and leaves the record alone
    let response = app
        .oneshot(post(
            "/api/git/sync",
            Some(&token),
            json!({
                "opusId": opus.id,
                "repositoryPath": dir.path(),
                "commitMessage": "Again"
            })
            .to_string(),
        ))
        .await
        .unwrap();
    let result = read_json(response).await;
    assert_eq!(result["success"], true);
    assert!(result.get("commitHash").is_none());
    let stored = repo.get_opus(&opus.id).unwrap().unwrap();
    assert_eq!(stored.last_commit_hash.as_deref(), Some(hash.as_str()));
}

#[tokio::test]
async fn sync_with_push_records_the_push_time() {
    let (app, repo, token) = setup();
    let dir = TempDir::new().unwrap();
    let git = init_repo(dir.path());
    let origin_dir = TempDir::new().unwrap();
    let origin = Repository::init_bare(origin_dir.path()).unwrap();
    git.remote("origin", origin_dir.path().to_str().unwrap())
        .unwrap();
    std::fs::write(dir.path().join("vision.md"), "# Vision\n").unwrap();

    let opus = repo
        .create_opus(&NewOpus {
            name: "Vision".into(),
            opus_type: "vision".into(),
            ..NewOpus::default()
        })
        .unwrap();

    // Any truthy JSON value asks for a push
    let response = app
        .oneshot(post(
            "/api/git/sync",
            Some(&token),
            json!({
                "opusId": opus.id,
                "repositoryPath": dir.path(),
                "commitMessage": "Update Vision",
                "push": 1
            })
            .to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = read_json(response).await;
    assert_eq!(result["success"], true);
    assert_eq!(result["pushedToRemote"], true);
    assert!(result.get("error").is_none());
    let hash = result["commitHash"].as_str().unwrap().to_string();

    let remote_head = origin.find_reference("refs/heads/main").unwrap();
    assert_eq!(remote_head.target().unwrap().to_string(), hash);

    let stored = repo.get_opus(&opus.id).unwrap().unwrap();
    assert_eq!(stored.last_commit_hash.as_deref(), Some(hash.as_str()));
    assert!(stored.last_commit_at.is_some());
    assert!(stored.last_push_at.is_some());
}

#[tokio::test]
async fn sync_for_an_unknown_opus_still_succeeds() {
    let (app, _repo, token) = setup();
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    std::fs::write(dir.path().join("notes.md"), "notes\n").unwrap();

    let response = app
        .oneshot(post(
            "/api/git/sync",
            Some(&token),
            json!({
                "opusId": "missing",
                "repositoryPath": dir.path(),
                "commitMessage": "Notes"
            })
            .to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = read_json(response).await;
    assert_eq!(result["success"], true);
    assert!(result["commitHash"].is_string());
}

#[tokio::test]
async fn opuses_can_be_filtered_by_type() {
    let (app, repo, token) = setup();
    for (name, opus_type) in [("Ship v2", "task"), ("North star", "vision")] {
        repo.create_opus(&NewOpus {
            name: name.into(),
            opus_type: opus_type.into(),
            ..NewOpus::default()
        })
        .unwrap();
    }

    let response = app
        .clone()
        .oneshot(get("/api/opuses?opusType=task", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ship v2"]);
    assert_eq!(body[0]["_count"]["items"], 0);

    let response = app.clone().oneshot(get("/api/opuses", &token)).await.unwrap();
    assert_eq!(read_json(response).await.as_array().unwrap().len(), 2);

    let response = app.oneshot(get("/api/opus-types", &token)).await.unwrap();
    let types = read_json(response).await;
    let keys: Vec<&str> = types
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["project", "task", "vision", "knowledge"]);
    assert_eq!(types[0]["icon"], "FolderKanban");
    assert_eq!(types[0]["textColor"], "text-sky-700");
}
