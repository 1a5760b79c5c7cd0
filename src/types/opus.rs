use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::icons::IconId;

/// A structured knowledge artifact as served by `GET /api/opuses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opus {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub raison_detre: String,
    pub opus_type: String,
    pub is_strategic: bool,
    pub is_dynamic: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "_count")]
    pub count: ItemCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_push_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCount {
    pub items: u32,
}

/// One entry of the fixed type vocabulary opuses are classified against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpusTypeConfig {
    pub key: String,
    pub label: String,
    pub icon: IconId,
    pub color: String,
    pub text_color: String,
}
