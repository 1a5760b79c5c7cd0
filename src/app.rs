// src/app.rs

use crate::browser::{GitSyncModal, OpusListView, ReloadTicket, StatusTicket, SyncOutcome, SyncTarget};
use crate::client::{ApiClient, SyncRequest};
use crate::commit_message::{CommitSubject, generate_commit_message};
use crate::types::{GitStatus, GitSyncResult, Opus, OpusTypeConfig};
use crossterm::event::{self, KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::info;
use tui::widgets::ListState;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Search,
    Sync,
}

/// Results of background requests, delivered back to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    Opuses {
        generation: u64,
        result: Result<Vec<Opus>, String>,
    },
    TypeConfigs {
        generation: u64,
        result: Result<Vec<OpusTypeConfig>, String>,
    },
    GitStatus {
        generation: u64,
        result: Result<GitStatus, String>,
    },
    Synced(Result<GitSyncResult, String>),
}

pub struct App {
    client: Arc<ApiClient>,
    repository_path: PathBuf,
    pub should_quit: bool,
    pub mode: AppMode,
    pub view: OpusListView,
    pub modal: GitSyncModal,
    pub list_state: ListState,
    pub search_input: Input,
    /// One-line message shown in the help bar, e.g. after a sync.
    pub notice: Option<String>,
    pub event_sender: mpsc::Sender<AppEvent>,
    pub event_receiver: mpsc::Receiver<AppEvent>,
}

impl App {
    pub fn new(client: ApiClient, repository_path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel(32);
        Self {
            client: Arc::new(client),
            repository_path,
            should_quit: false,
            mode: AppMode::Normal,
            view: OpusListView::new(),
            modal: GitSyncModal::new(),
            list_state: ListState::default(),
            search_input: Input::default(),
            notice: None,
            event_sender: tx,
            event_receiver: rx,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.mode {
            AppMode::Normal => self.handle_normal_mode_keys(key),
            AppMode::Search => self.handle_search_keys(key),
            AppMode::Sync => self.handle_sync_keys(key),
        }
    }

    fn handle_normal_mode_keys(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.view.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.view.select_previous(),
            KeyCode::Tab | KeyCode::Right => {
                if let Some(ticket) = self.view.cycle_type_filter(true) {
                    self.spawn_reload(ticket);
                }
            }
            KeyCode::BackTab | KeyCode::Left => {
                if let Some(ticket) = self.view.cycle_type_filter(false) {
                    self.spawn_reload(ticket);
                }
            }
            KeyCode::Char('/') => self.mode = AppMode::Search,
            KeyCode::Char('g') => self.open_sync_modal(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Esc => {
                self.search_input.reset();
                self.view.set_search_query("");
                self.notice = None;
            }
            _ => {}
        }
    }

    fn handle_search_keys(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.mode = AppMode::Normal,
            KeyCode::Esc => {
                self.search_input.reset();
                self.view.set_search_query("");
                self.mode = AppMode::Normal;
            }
            KeyCode::Down => self.view.select_next(),
            KeyCode::Up => self.view.select_previous(),
            _ => {
                self.search_input.handle_event(&event::Event::Key(key));
                self.view.set_search_query(self.search_input.value());
            }
        }
    }

    fn handle_sync_keys(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_sync(),
            KeyCode::Tab => self.modal.toggle_push(),
            KeyCode::Esc => {
                if let Some(outcome) = self.modal.skip() {
                    self.on_sync_closed(outcome);
                }
            }
            _ => {
                if !self.modal.is_loading() {
                    self.modal
                        .commit_input_mut()
                        .handle_event(&event::Event::Key(key));
                }
            }
        }
    }

    /// Reload opuses and type configs for the current filter.
    pub fn reload(&mut self) {
        let ticket = self.view.begin_reload();
        self.spawn_reload(ticket);
    }

    fn spawn_reload(&self, ticket: ReloadTicket) {
        let client = self.client.clone();
        let sender = self.event_sender.clone();
        let generation = ticket.generation;
        tokio::spawn(async move {
            let result = client
                .list_opuses(ticket.type_filter.as_deref())
                .await
                .map_err(|e| e.to_string());
            let _ = sender.send(AppEvent::Opuses { generation, result }).await;
        });

        let client = self.client.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let result = client.list_type_configs().await.map_err(|e| e.to_string());
            let _ = sender
                .send(AppEvent::TypeConfigs { generation, result })
                .await;
        });
    }

    fn open_sync_modal(&mut self) {
        let Some(opus) = self.view.selected() else {
            return;
        };
        let labels: Vec<String> = self
            .view
            .selected_type_config()
            .map(|config| config.label.clone())
            .into_iter()
            .collect();
        let title = format!("Update {}", opus.name);
        let default_commit_message = generate_commit_message(&CommitSubject {
            title: &title,
            labels: &labels,
            ..CommitSubject::default()
        });
        let target = SyncTarget {
            opus_id: opus.id.clone(),
            repository_path: self.repository_path.clone(),
            item_title: opus.name.clone(),
            default_commit_message,
        };

        let ticket = self.modal.open(target);
        self.mode = AppMode::Sync;
        self.spawn_status(ticket);
    }

    fn spawn_status(&self, ticket: StatusTicket) {
        let client = self.client.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let result = client
                .git_status(&ticket.repository_path)
                .await
                .map_err(|e| e.to_string());
            let _ = sender
                .send(AppEvent::GitStatus {
                    generation: ticket.generation,
                    result,
                })
                .await;
        });
    }

    fn submit_sync(&mut self) {
        let Some(request) = self.modal.begin_sync() else {
            return;
        };
        self.spawn_sync(request);
    }

    fn spawn_sync(&self, request: SyncRequest) {
        let client = self.client.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let result = client.git_sync(&request).await.map_err(|e| e.to_string());
            let _ = sender.send(AppEvent::Synced(result)).await;
        });
    }

    pub fn handle_event(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::Opuses { generation, result } => {
                self.view.apply_opuses(generation, result);
            }
            AppEvent::TypeConfigs { generation, result } => {
                self.view.apply_type_configs(generation, result);
            }
            AppEvent::GitStatus { generation, result } => {
                self.modal.apply_status(generation, result);
            }
            AppEvent::Synced(result) => self.modal.finish_sync(result, now),
        }
    }

    /// Drive timers; called once per loop iteration.
    pub fn on_tick(&mut self, now: Instant) {
        if let Some(outcome) = self.modal.poll(now) {
            self.on_sync_closed(outcome);
        }
    }

    fn on_sync_closed(&mut self, outcome: SyncOutcome) {
        self.mode = AppMode::Normal;
        self.notice = match outcome {
            SyncOutcome { committed: false, .. } => None,
            SyncOutcome { pushed: true, .. } => Some("Committed and pushed".to_string()),
            SyncOutcome { pushed: false, .. } => Some("Committed".to_string()),
        };
        if outcome.committed {
            info!("Sync finished (pushed: {}), reloading opuses", outcome.pushed);
            self.reload();
        }
    }
}
