//! Closed set of icons an opus type may reference.
//!
//! Type configurations name their icon by string. The string is parsed into
//! [`IconId`] when the configuration is loaded, so an unknown name is a load
//! error rather than a silent fallback at render time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconId {
    BookOpen,
    Calendar,
    Compass,
    FileText,
    FolderKanban,
    Layers,
    Lightbulb,
    ListChecks,
    Settings,
    Sparkles,
    Target,
    Zap,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown icon '{0}'")]
pub struct UnknownIcon(pub String);

impl IconId {
    pub const ALL: [IconId; 12] = [
        IconId::BookOpen,
        IconId::Calendar,
        IconId::Compass,
        IconId::FileText,
        IconId::FolderKanban,
        IconId::Layers,
        IconId::Lightbulb,
        IconId::ListChecks,
        IconId::Settings,
        IconId::Sparkles,
        IconId::Target,
        IconId::Zap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IconId::BookOpen => "BookOpen",
            IconId::Calendar => "Calendar",
            IconId::Compass => "Compass",
            IconId::FileText => "FileText",
            IconId::FolderKanban => "FolderKanban",
            IconId::Layers => "Layers",
            IconId::Lightbulb => "Lightbulb",
            IconId::ListChecks => "ListChecks",
            IconId::Settings => "Settings",
            IconId::Sparkles => "Sparkles",
            IconId::Target => "Target",
            IconId::Zap => "Zap",
        }
    }

    /// Terminal rendering of the icon.
    pub fn glyph(&self) -> &'static str {
        match self {
            IconId::BookOpen => "📖",
            IconId::Calendar => "📅",
            IconId::Compass => "🧭",
            IconId::FileText => "📄",
            IconId::FolderKanban => "🗂",
            IconId::Layers => "🧱",
            IconId::Lightbulb => "💡",
            IconId::ListChecks => "✅",
            IconId::Settings => "⚙",
            IconId::Sparkles => "✨",
            IconId::Target => "🎯",
            IconId::Zap => "⚡",
        }
    }
}

impl FromStr for IconId {
    type Err = UnknownIcon;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IconId::ALL
            .into_iter()
            .find(|icon| icon.as_str() == s)
            .ok_or_else(|| UnknownIcon(s.to_string()))
    }
}

impl fmt::Display for IconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IconId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IconId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
