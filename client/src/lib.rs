//! Cloud Deploy Client Library
//!
//! Client for the Cloud Deploy orchestration API, with real-time job log
//! streaming over WebSocket.

pub mod config;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod sanitize;
pub mod stream;

pub use config::Config;
pub use errors::ClientError;
pub use http::RestClient;
