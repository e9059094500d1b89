//! # iotdash-thingsboard
//!
//! Async client for the ThingsBoard REST API: device CRUD and credentials,
//! timeseries queries and uploads, attributes, RPC and alarms. The
//! [`analytics`] module holds the pure summaries the dashboard draws from
//! the returned timeseries.

pub mod analytics;
pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::ThingsBoardClient;
pub use config::{DEFAULT_BASE_URL, TOKEN_ENV, ThingsBoardConfig};
pub use error::{Result, ThingsBoardError};
