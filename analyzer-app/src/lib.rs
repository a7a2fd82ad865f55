//! Web front of the page analyzer: routing, handlers and views.
//!
//! The binary in `main.rs` wires configuration, logging and storage, then
//! serves [`app_router`]. Tests drive the same router in-process.
pub mod flash;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod state;
pub mod views;

pub use routes::app_router;
pub use state::AppState;
