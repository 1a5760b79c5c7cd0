// src/types/commit_info.rs

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct CommitInfo {
    pub id: String,
    pub message: String,
    pub author: CommitAuthor,
}

impl CommitInfo {
    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim_end()
    }
}

/// Identity written into the author field of a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl CommitAuthor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Pick the session identity when present, the fallback otherwise.
    /// Name and email fall back independently.
    pub fn or_fallback(name: Option<&str>, email: Option<&str>, fallback: &CommitAuthor) -> Self {
        let pick = |value: Option<&str>, default: &str| {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        Self {
            name: pick(name, &fallback.name),
            email: pick(email, &fallback.email),
        }
    }
}

impl std::fmt::Display for CommitAuthor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}
