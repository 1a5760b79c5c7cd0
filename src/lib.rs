pub mod app;
pub mod browser;
pub mod client;
pub mod commit_message;
pub mod config;
pub mod db;
pub mod git;
pub mod handlers;
pub mod icons;
pub mod types;
pub mod ui;
