mod repo;
mod schema;

pub use repo::{NewOpus, OpusRepo, SessionInfo, StoreError};
pub use schema::init_database;
