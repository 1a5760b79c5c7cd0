// src/types/status_info.rs

use git2::Status;

pub struct StatusInfo {
    pub path: String,
    pub status: Status,
}

impl StatusInfo {
    pub fn is_staged(&self) -> bool {
        self.status.is_index_new()
            || self.status.is_index_modified()
            || self.status.is_index_deleted()
            || self.status.is_index_renamed()
            || self.status.is_index_typechange()
    }

    pub fn is_untracked(&self) -> bool {
        self.status.is_wt_new() && !self.is_staged()
    }
}

/// Working tree status split into porcelain-style categories.
///
/// A path can appear in several lists (a file added to the index and then
/// edited again is both `staged` and `modified`), but `files` holds every
/// changed path exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub files: Vec<String>,
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    pub renamed: Vec<String>,
    pub conflicted: Vec<String>,
    pub not_added: Vec<String>,
}

impl StatusSnapshot {
    pub fn from_entries(entries: &[StatusInfo]) -> Self {
        let mut snapshot = Self::default();
        for entry in entries {
            let path = entry.path.clone();
            let status = entry.status;

            if status.is_conflicted() {
                snapshot.conflicted.push(path.clone());
            }
            if entry.is_staged() {
                snapshot.staged.push(path.clone());
            }
            if status.is_index_modified() || status.is_wt_modified() {
                snapshot.modified.push(path.clone());
            }
            if status.is_index_new() {
                snapshot.created.push(path.clone());
            }
            if status.is_index_deleted() || status.is_wt_deleted() {
                snapshot.deleted.push(path.clone());
            }
            if status.is_index_renamed() || status.is_wt_renamed() {
                snapshot.renamed.push(path.clone());
            }
            if entry.is_untracked() {
                snapshot.not_added.push(path.clone());
            }
            snapshot.files.push(path);
        }
        snapshot
    }

    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, status: Status) -> StatusInfo {
        StatusInfo {
            path: path.to_string(),
            status,
        }
    }

    #[test]
    fn categorizes_like_porcelain() {
        let entries = vec![
            entry("new.txt", Status::WT_NEW),
            entry("added.txt", Status::INDEX_NEW),
            entry("edited.txt", Status::WT_MODIFIED),
            entry("both.txt", Status::INDEX_MODIFIED | Status::WT_MODIFIED),
            entry("gone.txt", Status::WT_DELETED),
            entry("moved.txt", Status::INDEX_RENAMED),
            entry("clash.txt", Status::CONFLICTED),
        ];

        let snapshot = StatusSnapshot::from_entries(&entries);

        assert_eq!(snapshot.files.len(), 7);
        assert_eq!(snapshot.not_added, vec!["new.txt"]);
        assert_eq!(snapshot.created, vec!["added.txt"]);
        assert_eq!(snapshot.staged, vec!["added.txt", "both.txt", "moved.txt"]);
        assert_eq!(snapshot.modified, vec!["edited.txt", "both.txt"]);
        assert_eq!(snapshot.deleted, vec!["gone.txt"]);
        assert_eq!(snapshot.renamed, vec!["moved.txt"]);
        assert_eq!(snapshot.conflicted, vec!["clash.txt"]);
        assert!(!snapshot.is_clean());
    }

    #[test]
    fn empty_status_is_clean() {
        assert!(StatusSnapshot::from_entries(&[]).is_clean());
    }
}
