//! HTTP layer for the Cloud Deploy API

pub mod client;
pub mod jobs;

pub use client::RestClient;
