//! servicedesk: library crate shared by the binary and integration tests.

pub mod api;
pub mod config;
pub mod editor;
pub mod errors;
pub mod harness;
pub mod middleware;
pub mod models;
pub mod notification;
pub mod state;
pub mod store;
pub mod validation;

pub use state::AppState;
