// src/types/mod.rs

pub mod commit_info;
pub mod git_status;
pub mod opus;
pub mod status_info;
pub mod sync_result;

pub use commit_info::{CommitAuthor, CommitInfo};
pub use git_status::GitStatus;
pub use opus::{ItemCount, Opus, OpusTypeConfig};
pub use status_info::{StatusInfo, StatusSnapshot};
pub use sync_result::{ChangeSummary, GitSyncResult};
