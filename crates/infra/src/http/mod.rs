//! Outbound HTTP shared by the source adapters.

mod client;

pub use client::{HttpClient, HttpClientBuilder};
