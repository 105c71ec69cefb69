//! Shared HTTP transport for provider calls

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
