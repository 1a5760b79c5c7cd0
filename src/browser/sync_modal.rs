use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use tui_input::Input;

use crate::client::SyncRequest;
use crate::types::{GitStatus, GitSyncResult};

/// How long a successful result stays on screen before the dialog closes.
pub const AUTO_CLOSE_DELAY: Duration = Duration::from_secs(2);

/// What the dialog commits.
#[derive(Debug, Clone)]
pub struct SyncTarget {
    pub opus_id: String,
    pub repository_path: PathBuf,
    pub item_title: String,
    pub default_commit_message: String,
}

/// Status fetch issued when the dialog opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTicket {
    pub generation: u64,
    pub repository_path: PathBuf,
}

/// Reported to the owner when the dialog finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub committed: bool,
    pub pushed: bool,
}

#[derive(Default)]
pub struct GitSyncModal {
    target: Option<SyncTarget>,
    commit_message: Input,
    should_push: bool,
    loading: bool,
    status: Option<GitStatus>,
    result: Option<GitSyncResult>,
    close_at: Option<Instant>,
    generation: u64,
}

impl GitSyncModal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open for `target`, resetting every editable field. The caller runs the
    /// returned status fetch.
    pub fn open(&mut self, target: SyncTarget) -> StatusTicket {
        self.generation += 1;
        self.commit_message = Input::new(target.default_commit_message.clone());
        self.should_push = false;
        self.loading = false;
        self.status = None;
        self.result = None;
        self.close_at = None;
        let ticket = StatusTicket {
            generation: self.generation,
            repository_path: target.repository_path.clone(),
        };
        self.target = Some(target);
        ticket
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&SyncTarget> {
        self.target.as_ref()
    }

    /// Store a status response; a fetch error becomes a failed status.
    pub fn apply_status(&mut self, generation: u64, status: Result<GitStatus, String>) {
        if generation != self.generation || !self.is_open() {
            debug!("Discarding git status for a closed dialog");
            return;
        }
        self.status = Some(status.unwrap_or_else(|e| {
            warn!("Failed to fetch git status: {}", e);
            GitStatus::failure(e)
        }));
    }

    pub fn status(&self) -> Option<&GitStatus> {
        self.status.as_ref()
    }

    pub fn commit_message(&self) -> &str {
        self.commit_message.value()
    }

    pub fn commit_input_mut(&mut self) -> &mut Input {
        &mut self.commit_message
    }

    pub fn should_push(&self) -> bool {
        self.should_push
    }

    pub fn toggle_push(&mut self) {
        if !self.loading {
            self.should_push = !self.should_push;
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// False while loading, while a success is waiting to auto-close, and
    /// when the message is blank.
    pub fn can_submit(&self) -> bool {
        self.is_open()
            && !self.loading
            && self.close_at.is_none()
            && !self.commit_message().trim().is_empty()
    }

    /// Lock the dialog and build the request, or `None` when submitting is
    /// disabled.
    pub fn begin_sync(&mut self) -> Option<SyncRequest> {
        if !self.can_submit() {
            return None;
        }
        let target = self.target.as_ref()?;
        let request = SyncRequest {
            opus_id: Some(target.opus_id.clone()),
            repository_path: target.repository_path.to_string_lossy().into_owned(),
            commit_message: self.commit_message().to_string(),
            push: self.should_push,
        };
        self.loading = true;
        self.result = None;
        Some(request)
    }

    /// Record the sync outcome. A transport error is turned into a failed
    /// result; a success arms the auto-close timer.
    pub fn finish_sync(&mut self, result: Result<GitSyncResult, String>, now: Instant) {
        if !self.is_open() {
            return;
        }
        self.loading = false;
        let result = result.unwrap_or_else(|e| {
            warn!("Git sync failed: {}", e);
            GitSyncResult::failure(e)
        });
        if result.success {
            self.close_at = Some(now + AUTO_CLOSE_DELAY);
        }
        self.result = Some(result);
    }

    pub fn result(&self) -> Option<&GitSyncResult> {
        self.result.as_ref()
    }

    /// Close once the auto-close deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<SyncOutcome> {
        let deadline = self.close_at?;
        if now < deadline {
            return None;
        }
        Some(self.complete())
    }

    /// Leave without syncing. Disabled while a sync is in flight; after a
    /// successful sync it closes early with the real outcome.
    pub fn skip(&mut self) -> Option<SyncOutcome> {
        if !self.is_open() || self.loading {
            return None;
        }
        if self.close_at.is_some() {
            return Some(self.complete());
        }
        self.close();
        Some(SyncOutcome {
            committed: false,
            pushed: false,
        })
    }

    pub fn submit_label(&self) -> &'static str {
        match (self.loading, self.should_push) {
            (true, true) => "Committing & Pushing...",
            (true, false) => "Committing...",
            (false, true) => "Commit & Push",
            (false, false) => "Commit Only",
        }
    }

    pub fn result_message(&self) -> Option<String> {
        let result = self.result.as_ref()?;
        Some(if result.success && result.pushed() {
            "Committed and pushed successfully!".to_string()
        } else if result.success {
            "Committed successfully!".to_string()
        } else {
            result
                .error
                .clone()
                .unwrap_or_else(|| "Sync failed".to_string())
        })
    }

    fn complete(&mut self) -> SyncOutcome {
        let pushed = self.result.as_ref().is_some_and(GitSyncResult::pushed);
        self.close();
        SyncOutcome {
            committed: true,
            pushed,
        }
    }

    fn close(&mut self) {
        self.target = None;
        self.close_at = None;
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> SyncTarget {
        SyncTarget {
            opus_id: "op-1".into(),
            repository_path: PathBuf::from("/srv/notes"),
            item_title: "Roadmap".into(),
            default_commit_message: "Update Roadmap".into(),
        }
    }

    fn committed(pushed: Option<bool>) -> GitSyncResult {
        GitSyncResult {
            success: true,
            commit_hash: Some("abc".into()),
            pushed_to_remote: pushed,
            ..GitSyncResult::default()
        }
    }

    #[test]
    fn opening_resets_previous_state() {
        let mut modal = GitSyncModal::new();
        modal.open(target());
        modal.toggle_push();
        modal.begin_sync().unwrap();
        modal.finish_sync(Err("offline".into()), Instant::now());
        modal.skip().unwrap();

        let ticket = modal.open(target());
        assert_eq!(ticket.repository_path, PathBuf::from("/srv/notes"));
        assert_eq!(modal.commit_message(), "Update Roadmap");
        assert!(!modal.should_push());
        assert!(modal.result().is_none());
        assert!(modal.status().is_none());
    }

    #[test]
    fn status_from_a_previous_opening_is_ignored() {
        let mut modal = GitSyncModal::new();
        let first = modal.open(target());
        let second = modal.open(target());

        modal.apply_status(first.generation, Ok(GitStatus::failure("old")));
        assert!(modal.status().is_none());

        modal.apply_status(second.generation, Err("connection refused".into()));
        let status = modal.status().unwrap();
        assert!(!status.success);
        assert_eq!(status.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn blank_message_disables_submit() {
        let mut modal = GitSyncModal::new();
        modal.open(SyncTarget {
            default_commit_message: "   ".into(),
            ..target()
        });
        assert!(!modal.can_submit());
        assert!(modal.begin_sync().is_none());
    }

    #[test]
    fn submit_locks_until_finished() {
        let mut modal = GitSyncModal::new();
        modal.open(target());
        modal.toggle_push();

        let request = modal.begin_sync().unwrap();
        assert_eq!(request.opus_id.as_deref(), Some("op-1"));
        assert_eq!(request.repository_path, "/srv/notes");
        assert!(request.push);
        assert_eq!(modal.submit_label(), "Committing & Pushing...");

        assert!(modal.begin_sync().is_none());
        assert!(modal.skip().is_none());
    }

    #[test]
    fn success_closes_after_the_delay() {
        let mut modal = GitSyncModal::new();
        modal.open(target());
        modal.toggle_push();
        modal.begin_sync().unwrap();

        let start = Instant::now();
        modal.finish_sync(Ok(committed(Some(true))), start);
        assert_eq!(
            modal.result_message().as_deref(),
            Some("Committed and pushed successfully!")
        );

        assert_eq!(modal.poll(start + Duration::from_millis(1999)), None);
        assert!(modal.is_open());
        assert_eq!(
            modal.poll(start + AUTO_CLOSE_DELAY),
            Some(SyncOutcome {
                committed: true,
                pushed: true
            })
        );
        assert!(!modal.is_open());
        assert_eq!(modal.poll(start + Duration::from_secs(10)), None);
    }

    #[test]
    fn pending_close_blocks_resubmit_and_skip_reports_the_commit() {
        let mut modal = GitSyncModal::new();
        modal.open(target());
        modal.begin_sync().unwrap();
        modal.finish_sync(Ok(committed(None)), Instant::now());

        assert!(!modal.can_submit());
        assert!(modal.begin_sync().is_none());
        assert_eq!(
            modal.skip(),
            Some(SyncOutcome {
                committed: true,
                pushed: false
            })
        );
        assert!(!modal.is_open());
    }

    #[test]
    fn failed_push_reports_commit_only() {
        let mut modal = GitSyncModal::new();
        modal.open(target());
        modal.begin_sync().unwrap();
        let start = Instant::now();
        modal.finish_sync(Ok(committed(Some(false))), start);

        assert_eq!(
            modal.result_message().as_deref(),
            Some("Committed successfully!")
        );
        assert_eq!(
            modal.poll(start + AUTO_CLOSE_DELAY),
            Some(SyncOutcome {
                committed: true,
                pushed: false
            })
        );
    }

    #[test]
    fn failure_stays_open_and_can_retry() {
        let mut modal = GitSyncModal::new();
        modal.open(target());
        modal.begin_sync().unwrap();
        let start = Instant::now();
        modal.finish_sync(
            Ok(GitSyncResult::failure("/srv/notes is not a git repository")),
            start,
        );

        assert_eq!(modal.poll(start + Duration::from_secs(5)), None);
        assert!(modal.is_open());
        assert_eq!(
            modal.result_message().as_deref(),
            Some("/srv/notes is not a git repository")
        );
        assert_eq!(modal.submit_label(), "Commit Only");
        assert!(modal.begin_sync().is_some());
        assert!(modal.result().is_none());
    }

    #[test]
    fn transport_error_becomes_a_failed_result() {
        let mut modal = GitSyncModal::new();
        modal.open(target());
        modal.begin_sync().unwrap();
        modal.finish_sync(Err("connection reset".into()), Instant::now());

        let result = modal.result().unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("connection reset"));
        assert!(!modal.is_loading());
    }

    #[test]
    fn skip_reports_nothing_done() {
        let mut modal = GitSyncModal::new();
        modal.open(target());
        assert_eq!(
            modal.skip(),
            Some(SyncOutcome {
                committed: false,
                pushed: false
            })
        );
        assert!(!modal.is_open());
        assert!(modal.skip().is_none());
    }
}
