//! Terminal-independent state for the opus browser.

pub mod filter;
pub mod list_view;
pub mod sync_modal;

pub use filter::EmptyState;
pub use list_view::{OpusListView, ReloadTicket, VisibleOpus};
pub use sync_modal::{GitSyncModal, StatusTicket, SyncOutcome, SyncTarget};
