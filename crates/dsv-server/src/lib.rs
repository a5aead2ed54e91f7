//! HTTP service for the dataset store.
//!
//! Exposes metadata writes and reads, multipart payload uploads, downloads,
//! version history, and deletion over JSON routes under a configurable
//! prefix. Store calls run on tokio's blocking pool.

pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::DsvServer;
