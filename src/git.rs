// src/git.rs

use crate::types::{
    ChangeSummary, CommitAuthor, CommitInfo, GitStatus, GitSyncResult, StatusInfo, StatusSnapshot,
};
use git2::{
    self, BranchType, Cred, ErrorCode, IndexAddOption, PushOptions, RemoteCallbacks, Repository,
    Signature, StatusOptions,
};
use std::cell::RefCell;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

pub const DEFAULT_BRANCH: &str = "main";
const REMOTE_NAME: &str = "origin";
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("{} is not a git repository", .0.display())]
    NotARepository(PathBuf),

    #[error("failed to read status: {0}")]
    Status(#[source] git2::Error),

    #[error("failed to stage changes: {0}")]
    Stage(#[source] git2::Error),

    #[error("failed to create commit: {0}")]
    Commit(#[source] git2::Error),

    #[error("failed to push: {0}")]
    Push(#[source] git2::Error),

    #[error("push rejected: {0}")]
    PushRejected(String),

    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// Inputs of a sync. There are no implicit identities: the caller always
/// supplies the author.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub repository_path: PathBuf,
    pub commit_message: String,
    pub branch: String,
    pub push: bool,
    pub author: CommitAuthor,
}

impl SyncOptions {
    pub fn new(
        repository_path: impl Into<PathBuf>,
        commit_message: impl Into<String>,
        author: CommitAuthor,
    ) -> Self {
        Self {
            repository_path: repository_path.into(),
            commit_message: commit_message.into(),
            branch: DEFAULT_BRANCH.to_string(),
            push: false,
            author,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }
}

/// Open the work tree containing `path`. Bare repositories and anything
/// outside a work tree are rejected.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    match Repository::discover(path) {
        Ok(repo) if !repo.is_bare() => Ok(repo),
        _ => Err(GitError::NotARepository(path.to_path_buf())),
    }
}

pub fn fetch_status(repo: &Repository) -> Result<Vec<StatusInfo>, GitError> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .renames_head_to_index(true);

    let statuses = repo.statuses(Some(&mut opts)).map_err(GitError::Status)?;
    Ok(statuses
        .iter()
        .filter(|entry| !entry.status().is_ignored())
        .map(|entry| StatusInfo {
            path: entry.path().unwrap_or("").to_string(),
            status: entry.status(),
        })
        .collect())
}

/// Name of the checked out branch. Unborn branches report the name `HEAD`
/// points at; a detached head reports `HEAD`.
pub fn current_branch(repo: &Repository) -> Result<String, GitError> {
    match repo.head() {
        Ok(head) => Ok(head.shorthand().unwrap_or("HEAD").to_string()),
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            let head = repo.find_reference("HEAD")?;
            Ok(head
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .unwrap_or("HEAD")
                .to_string())
        }
        Err(e) => Err(e.into()),
    }
}

/// Commits on the current branch not on its upstream, and the reverse.
/// Zero for both when there is no upstream.
pub fn ahead_behind(repo: &Repository) -> (usize, usize) {
    let counts = || -> Option<(usize, usize)> {
        let head = repo.head().ok()?;
        if !head.is_branch() {
            return None;
        }
        let local = head.target()?;
        let branch = repo.find_branch(head.shorthand()?, BranchType::Local).ok()?;
        let upstream = branch.upstream().ok()?.get().target()?;
        repo.graph_ahead_behind(local, upstream).ok()
    };
    counts().unwrap_or((0, 0))
}

/// Stage every change in the work tree, deletions included.
pub fn stage_all(repo: &Repository) -> Result<(), GitError> {
    let mut index = repo.index().map_err(GitError::Stage)?;
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .map_err(GitError::Stage)?;
    index
        .update_all(["*"].iter(), None)
        .map_err(GitError::Stage)?;
    index.write().map_err(GitError::Stage)?;
    Ok(())
}

/// Commit the index on top of `HEAD`, attributed to `author`. The committer
/// comes from the repository configuration and falls back to the author.
pub fn create_commit(
    repo: &Repository,
    message: &str,
    author: &CommitAuthor,
) -> Result<CommitInfo, GitError> {
    let mut index = repo.index().map_err(GitError::Commit)?;
    let oid = index.write_tree().map_err(GitError::Commit)?;
    let tree = repo.find_tree(oid).map_err(GitError::Commit)?;

    let author_sig = Signature::now(&author.name, &author.email).map_err(GitError::Commit)?;
    let committer = match repo.signature() {
        Ok(sig) => sig,
        Err(_) => Signature::now(&author.name, &author.email).map_err(GitError::Commit)?,
    };

    let parent = match repo.head() {
        Ok(head) => head
            .target()
            .map(|target| repo.find_commit(target))
            .transpose()
            .map_err(GitError::Commit)?,
        Err(e) if e.code() == ErrorCode::UnbornBranch => None,
        Err(e) => return Err(GitError::Commit(e)),
    };
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    let commit_oid = repo
        .commit(
            Some("HEAD"),
            &author_sig,
            &committer,
            message,
            &tree,
            &parents,
        )
        .map_err(GitError::Commit)?;

    Ok(CommitInfo {
        id: commit_oid.to_string(),
        message: message.to_string(),
        author: author.clone(),
    })
}

/// Push `branch` to `origin`. Blocks until the transfer finishes.
pub fn push_to_remote(repo: &Repository, branch: &str) -> Result<(), GitError> {
    let mut remote = repo.find_remote(REMOTE_NAME).map_err(GitError::Push)?;
    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    let rejection: RefCell<Option<String>> = RefCell::new(None);

    {
        let cfg = repo.config().ok();
        let mut attempts = 0;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username_from_url, allowed| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("no usable credentials"));
            }
            if allowed.is_ssh_key() {
                let username = username_from_url.unwrap_or("git");
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
                if let Some(home) = env::var_os("HOME") {
                    let private_key = Path::new(&home).join(".ssh/id_rsa");
                    if private_key.exists() {
                        return Cred::ssh_key(username, None, &private_key, None);
                    }
                }
            }
            if allowed.is_user_pass_plaintext()
                && let Some(cfg) = cfg.as_ref()
                && let Ok(cred) = Cred::credential_helper(cfg, url, username_from_url)
            {
                return Ok(cred);
            }
            Cred::default()
        });
        callbacks.push_update_reference(|_refname, status| {
            if let Some(msg) = status {
                *rejection.borrow_mut() = Some(msg.to_string());
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);
        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(GitError::Push)?;
    }

    match rejection.into_inner() {
        Some(msg) => Err(GitError::PushRejected(msg)),
        None => Ok(()),
    }
}

/// Read-only status of the repository at `repository_path`. Failures come
/// back as `success: false` rather than an error.
pub fn get_git_status(repository_path: &Path) -> GitStatus {
    match read_status(repository_path) {
        Ok(status) => status,
        Err(e) => {
            debug!("Git status failed for {}: {}", repository_path.display(), e);
            GitStatus::failure(e.to_string())
        }
    }
}

fn read_status(repository_path: &Path) -> Result<GitStatus, GitError> {
    let repo = open_repository(repository_path)?;
    let entries = fetch_status(&repo)?;
    let snapshot = StatusSnapshot::from_entries(&entries);
    let branch = current_branch(&repo)?;
    let (ahead, behind) = ahead_behind(&repo);
    Ok(GitStatus::from_snapshot(branch, ahead, behind, snapshot))
}

/// Stage everything, commit, and optionally push.
///
/// `repository_path` may point anywhere inside a work tree. The repository
/// is discovered upward from it and staging covers the whole work tree, not
/// only that directory.
///
/// A clean work tree is a successful no-op without a commit hash. A failed
/// push leaves `success` set and reports the failure in `error` next to the
/// commit hash.
pub fn sync_to_git(options: &SyncOptions) -> GitSyncResult {
    match run_sync(options) {
        Ok(result) => result,
        Err(e) => {
            error!(
                "Git sync failed for {}: {}",
                options.repository_path.display(),
                e
            );
            GitSyncResult::failure(e.to_string())
        }
    }
}

fn run_sync(options: &SyncOptions) -> Result<GitSyncResult, GitError> {
    let repo = open_repository(&options.repository_path)?;

    // Captured before staging; the reported change lists describe what was
    // pending when the sync started.
    let snapshot = StatusSnapshot::from_entries(&fetch_status(&repo)?);
    if snapshot.is_clean() {
        debug!(
            "Nothing to commit in {}",
            options.repository_path.display()
        );
        return Ok(GitSyncResult::nothing_to_commit());
    }

    stage_all(&repo)?;
    let commit = create_commit(&repo, &options.commit_message, &options.author)?;
    info!(
        "Committed {} file(s) in {} as {} [{}] \"{}\"",
        snapshot.files.len(),
        options.repository_path.display(),
        commit.author,
        commit.id,
        commit.summary()
    );

    let mut result = GitSyncResult {
        success: true,
        commit_hash: Some(commit.id),
        pushed_to_remote: None,
        changes: Some(ChangeSummary {
            staged: snapshot.staged,
            unstaged: snapshot.not_added,
            untracked: snapshot.created,
        }),
        error: None,
    };

    if options.push {
        match push_to_remote(&repo, &options.branch) {
            Ok(()) => {
                info!("Pushed {} to {}", options.branch, REMOTE_NAME);
                result.pushed_to_remote = Some(true);
            }
            Err(e) => {
                error!("Push failed: {}", e);
                result.pushed_to_remote = Some(false);
                result.error = Some(format!("Commit succeeded but push failed: {e}"));
            }
        }
    }

    Ok(result)
}
