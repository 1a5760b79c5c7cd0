use serde::{Deserialize, Serialize};

/// Files that were pending when a sync started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
    pub untracked: Vec<String>,
}

/// Outcome of a sync. `pushed_to_remote` is only set when a push was
/// requested; `Some(false)` together with `success: true` means the commit
/// landed and the push did not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSyncResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushed_to_remote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GitSyncResult {
    pub fn nothing_to_commit() -> Self {
        Self {
            success: true,
            changes: Some(ChangeSummary::default()),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn pushed(&self) -> bool {
        self.pushed_to_remote.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_omits_absent_fields() {
        let result = GitSyncResult {
            success: true,
            commit_hash: Some("abc123".into()),
            pushed_to_remote: Some(false),
            changes: None,
            error: Some("Commit succeeded but push failed: offline".into()),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["commitHash"], "abc123");
        assert_eq!(json["pushedToRemote"], false);
        assert!(json.get("changes").is_none());

        let noop = serde_json::to_value(GitSyncResult::nothing_to_commit()).unwrap();
        assert_eq!(
            noop,
            serde_json::json!({
                "success": true,
                "changes": { "staged": [], "unstaged": [], "untracked": [] }
            })
        );
    }
}
