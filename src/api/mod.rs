//! Read-only dashboard API

pub mod routes;
pub mod server;

pub use server::{bind_with_fallback, create_app, AppState};
