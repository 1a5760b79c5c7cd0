use std::fmt::Display;

use tracing::{debug, warn};

use super::filter::{EmptyState, filter_opuses, find_type_config};
use crate::types::{Opus, OpusTypeConfig};

/// Handed out when a reload starts. Responses carrying an older generation
/// than the latest ticket are dropped, so a slow response for a previous
/// filter never overwrites a newer one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadTicket {
    pub generation: u64,
    pub type_filter: Option<String>,
}

pub struct VisibleOpus<'a> {
    pub opus: &'a Opus,
    pub type_config: &'a OpusTypeConfig,
}

/// State behind the opus list/detail screen.
pub struct OpusListView {
    opuses: Vec<Opus>,
    type_configs: Vec<OpusTypeConfig>,
    selected_id: Option<String>,
    type_filter: Option<String>,
    search_query: String,
    loading: bool,
    generation: u64,
    filtered: Vec<usize>,
}

impl Default for OpusListView {
    fn default() -> Self {
        Self::new()
    }
}

impl OpusListView {
    pub fn new() -> Self {
        Self {
            opuses: Vec::new(),
            type_configs: Vec::new(),
            selected_id: None,
            type_filter: None,
            search_query: String::new(),
            loading: true,
            generation: 0,
            filtered: Vec::new(),
        }
    }

    /// Start a reload of both lists for the current type filter.
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.generation += 1;
        self.loading = true;
        ReloadTicket {
            generation: self.generation,
            type_filter: self.type_filter.clone(),
        }
    }

    /// Change the type filter; returns a ticket when a reload is needed.
    pub fn set_type_filter(&mut self, type_filter: Option<String>) -> Option<ReloadTicket> {
        if self.type_filter == type_filter {
            return None;
        }
        self.type_filter = type_filter;
        self.refilter();
        Some(self.begin_reload())
    }

    /// Step through "all types" followed by each configured type.
    pub fn cycle_type_filter(&mut self, forward: bool) -> Option<ReloadTicket> {
        let mut keys: Vec<Option<String>> = vec![None];
        keys.extend(self.type_configs.iter().map(|c| Some(c.key.clone())));

        let current = keys
            .iter()
            .position(|key| *key == self.type_filter)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % keys.len()
        } else {
            (current + keys.len() - 1) % keys.len()
        };
        self.set_type_filter(keys.swap_remove(next))
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.search_query {
            self.search_query = query;
            self.refilter();
        }
    }

    /// Apply an opus list response. Returns false when the response was
    /// stale and ignored. A failed load keeps the previous list.
    pub fn apply_opuses<E: Display>(
        &mut self,
        generation: u64,
        result: Result<Vec<Opus>, E>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                "Discarding stale opus list (generation {} < {})",
                generation, self.generation
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(opuses) => {
                self.opuses = opuses;
                self.reconcile_selection();
                self.refilter();
            }
            Err(e) => warn!("Failed to load opuses: {}", e),
        }
        true
    }

    pub fn apply_type_configs<E: Display>(
        &mut self,
        generation: u64,
        result: Result<Vec<OpusTypeConfig>, E>,
    ) -> bool {
        if generation != self.generation {
            debug!(
                "Discarding stale type configs (generation {} < {})",
                generation, self.generation
            );
            return false;
        }
        match result {
            Ok(configs) => {
                self.type_configs = configs;
                self.refilter();
            }
            Err(e) => warn!("Failed to fetch opus type configs: {}", e),
        }
        true
    }

    /// Filtered opuses paired with their type. Opuses whose type is not in
    /// the vocabulary are left out.
    pub fn visible(&self) -> Vec<VisibleOpus<'_>> {
        self.filtered
            .iter()
            .filter_map(|&index| {
                let opus = &self.opuses[index];
                find_type_config(&self.type_configs, &opus.opus_type)
                    .map(|type_config| VisibleOpus { opus, type_config })
            })
            .collect()
    }

    /// Set when nothing is visible.
    pub fn empty_state(&self) -> Option<EmptyState> {
        self.visible().is_empty().then(|| {
            EmptyState::for_filters(self.type_filter.as_deref(), &self.search_query)
        })
    }

    pub fn select(&mut self, opus_id: &str) {
        if self.opuses.iter().any(|o| o.id == opus_id) {
            self.selected_id = Some(opus_id.to_string());
        }
    }

    pub fn select_next(&mut self) {
        self.step_selection(true);
    }

    pub fn select_previous(&mut self) {
        self.step_selection(false);
    }

    pub fn selected(&self) -> Option<&Opus> {
        let id = self.selected_id.as_deref()?;
        self.opuses.iter().find(|o| o.id == id)
    }

    pub fn selected_type_config(&self) -> Option<&OpusTypeConfig> {
        find_type_config(&self.type_configs, &self.selected()?.opus_type)
    }

    /// Position of the selection within [`Self::visible`].
    pub fn selected_visible_index(&self) -> Option<usize> {
        let id = self.selected_id.as_deref()?;
        self.visible().iter().position(|v| v.opus.id == id)
    }

    pub fn type_configs(&self) -> &[OpusTypeConfig] {
        &self.type_configs
    }

    pub fn type_filter(&self) -> Option<&str> {
        self.type_filter.as_deref()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn refilter(&mut self) {
        self.filtered = filter_opuses(
            &self.opuses,
            &self.type_configs,
            self.type_filter.as_deref(),
            &self.search_query,
        );
    }

    /// Keep the selection when the opus is still present, otherwise fall
    /// back to the first record.
    fn reconcile_selection(&mut self) {
        let still_present = self
            .selected_id
            .as_deref()
            .is_some_and(|id| self.opuses.iter().any(|o| o.id == id));
        if !still_present {
            self.selected_id = self.opuses.first().map(|o| o.id.clone());
        }
    }

    fn step_selection(&mut self, forward: bool) {
        let ids: Vec<String> = self.visible().iter().map(|v| v.opus.id.clone()).collect();
        if ids.is_empty() {
            return;
        }
        let len = ids.len();
        let next = match self.selected_visible_index() {
            None => 0,
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
        };
        self.selected_id = Some(ids[next].clone());
    }
}
