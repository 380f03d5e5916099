//! HTTP implementations of the sync engine's remote boundaries.

pub mod ai;
pub mod config;
mod http;
pub mod posts;

pub use ai::AiClient;
pub use config::{ClientConfig, DEFAULT_API_BASE};
pub use posts::PostsClient;
