//! School chat client.
//!
//! A polling chat client: [`network::SyncEngine`] keeps one room in sync with
//! a remote HTTP endpoint, [`network::ChatClient`] owns a logged-in session
//! and the [`ui`] module renders it with egui.

pub mod common;
pub mod config;
pub mod error;
pub mod network;
pub mod storage;
pub mod ui;
pub mod validation;

pub use error::SyncError;
