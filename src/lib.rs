//! Colosseum Hackathon Bot Library
//!
//! An autonomous agent that keeps a hackathon project alive on the
//! Colosseum contest platform:
//!
//! 1. **Scheduled loop**: every cycle it simulates a small batch of trades,
//!    refreshes contest state, and runs engagement actions off a fixed
//!    per-cycle schedule (project updates, forum posts, polls, peer votes).
//! 2. **Dashboard API**: a read-only JSON API over the local SQLite store,
//!    served alongside the loop for a static dashboard to poll.
//!
//! Without a contest credential every remote call degrades to a no-op and
//! the bot keeps trading and serving locally.

pub mod advisor;
pub mod api;
pub mod config;
pub mod contest;
pub mod db;
pub mod orchestrator;
pub mod prices;
pub mod services;
pub mod trading;
pub mod types;

pub use advisor::AdvisoryClient;
pub use config::Config;
pub use contest::{CallOutcome, ContestClient, ProjectPayload};
pub use db::Database;
pub use orchestrator::Orchestrator;
pub use types::{Decision, Strategy, Trade, TradeStats};
