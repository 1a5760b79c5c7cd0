use serde::{Deserialize, Serialize};

use super::StatusSnapshot;

/// Flat status payload returned by `POST /api/git/status`.
///
/// Everything except `success` is optional: a successful query fills in the
/// branch, counts and lists, a failed one carries only `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ahead: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behind: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staged: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicted: Option<Vec<String>>,
    /// Untracked paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_added: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GitStatus {
    pub fn from_snapshot(
        branch: String,
        ahead: usize,
        behind: usize,
        snapshot: StatusSnapshot,
    ) -> Self {
        Self {
            success: true,
            branch: Some(branch),
            ahead: Some(ahead),
            behind: Some(behind),
            staged: Some(snapshot.staged),
            modified: Some(snapshot.modified),
            created: Some(snapshot.created),
            deleted: Some(snapshot.deleted),
            renamed: Some(snapshot.renamed),
            conflicted: Some(snapshot.conflicted),
            not_added: Some(snapshot.not_added),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// True when a successful status lists no changed or untracked paths.
    pub fn is_clean(&self) -> bool {
        self.success
            && [
                &self.staged,
                &self.modified,
                &self.created,
                &self.deleted,
                &self.renamed,
                &self.conflicted,
                &self.not_added,
            ]
            .iter()
            .all(|list| list.as_ref().is_none_or(|l| l.is_empty()))
    }
}
