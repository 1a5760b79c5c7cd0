use crate::types::{Opus, OpusTypeConfig};

/// Linear scan; the vocabulary is a handful of entries.
pub fn find_type_config<'a>(
    configs: &'a [OpusTypeConfig],
    key: &str,
) -> Option<&'a OpusTypeConfig> {
    configs.iter().find(|config| config.key == key)
}

/// Case-insensitive substring match on name, content, raison d'être and the
/// label of the resolved type. `needle` must already be lowercase.
pub fn matches_query(opus: &Opus, type_config: Option<&OpusTypeConfig>, needle: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(needle);
    hit(&opus.name)
        || hit(&opus.content)
        || (!opus.raison_detre.is_empty() && hit(&opus.raison_detre))
        || type_config.is_some_and(|config| hit(&config.label))
}

/// Indices into `opuses` that pass the type filter and the search query.
/// A blank query matches everything.
pub fn filter_opuses(
    opuses: &[Opus],
    configs: &[OpusTypeConfig],
    type_filter: Option<&str>,
    query: &str,
) -> Vec<usize> {
    let needle = (!query.trim().is_empty()).then(|| query.to_lowercase());

    opuses
        .iter()
        .enumerate()
        .filter(|(_, opus)| type_filter.is_none_or(|key| opus.opus_type == key))
        .filter(|(_, opus)| match &needle {
            Some(needle) => {
                matches_query(opus, find_type_config(configs, &opus.opus_type), needle)
            }
            None => true,
        })
        .map(|(index, _)| index)
        .collect()
}

/// What to show when the filtered list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// A type filter or search is active.
    NoMatches,
    NoOpuses,
}

impl EmptyState {
    pub fn for_filters(type_filter: Option<&str>, query: &str) -> Self {
        if type_filter.is_some() || !query.is_empty() {
            EmptyState::NoMatches
        } else {
            EmptyState::NoOpuses
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EmptyState::NoMatches => "No opuses match your filters.",
            EmptyState::NoOpuses => "No opuses yet.",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            EmptyState::NoMatches => "Try adjusting your search or filters.",
            EmptyState::NoOpuses => "Create your first opus to get started.",
        }
    }
}
