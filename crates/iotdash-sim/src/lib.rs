//! # iotdash-sim - Simulated IoT Fleet Backend
//!
//! In-memory fleet of IoT devices whose metrics, telemetry and alerts
//! evolve on every poll. Serves the dashboard polling API and the static
//! configuration document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         iotdash-sim                                  │
//! │                                                                      │
//! │   ┌─────────────────────────────────────────────────────────────┐   │
//! │   │                  SimulationStore                             │   │
//! │   │                                                             │   │
//! │   │  ┌─────────────┐  ┌─────────────┐  ┌────────────────────┐  │   │
//! │   │  │  Factories  │  │  Generator  │  │    Aggregator       │  │   │
//! │   │  │ (entities)  │──│  (values)   │──│  (dashboard stats)  │  │   │
//! │   │  └─────────────┘  └─────────────┘  └────────────────────┘  │   │
//! │   │         │                │                    │            │   │
//! │   │         └────────────────┼────────────────────┘            │   │
//! │   │                          ▼                                  │   │
//! │   │               ┌──────────────────────┐                      │   │
//! │   │               │  SimulationSnapshot  │                      │   │
//! │   │               │ (devices, telemetry, │                      │   │
//! │   │               │  alerts, dashboard)  │                      │   │
//! │   │               └──────────────────────┘                      │   │
//! │   └─────────────────────────────────────────────────────────────┘   │
//! │                              ▲                                       │
//! │                              │ handle_poll / handle_control          │
//! │   ┌──────────────────────────┴──────────────────────────────────┐   │
//! │   │  api (framework-agnostic)  ◀──  server (axum router)         │   │
//! │   └─────────────────────────────────────────────────────────────┘   │
//! │                                                                      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iotdash_sim::{SimulationStore, SimulationConfig};
//!
//! let mut store = SimulationStore::new(SimulationConfig::default());
//!
//! // First poll builds the fleet, later polls advance it one step
//! store.poll();
//! store.poll();
//!
//! let snapshot = store.snapshot();
//! println!("{} devices, {} alerts", snapshot.devices.len(), snapshot.alerts.len());
//! ```

// Core types - devices, telemetry, alerts, dashboard
pub mod core;

// Random value producers and metric bounds
pub mod generator;

// Entity factories built on the generator
pub mod factories;

// Dashboard statistics
pub mod aggregator;

// Simulation store (initialize / advance / lifecycle)
pub mod engine;

// TOML configuration
pub mod config;

// Polling & control API
pub mod api;

// HTTP server
pub mod server;

// Re-exports for convenience
pub use crate::core::{
    Alert, AlertKind, BatteryReading, DashboardStats, Device, DeviceKind, DeviceStatus, Protocol,
    SensorGroup, Severity, SimulationSnapshot, TelemetryMap, TelemetrySample, TelemetrySeries,
};

pub use engine::{EngineState, EngineStats, SimulationStore};

pub use config::{AppConfig, ConfigError, NetworkSettings, RegisteredDevice, ServerConfig, SimulationConfig, Threshold};

pub use factories::{generate_alerts, generate_devices, generate_telemetry, list_alert_templates, list_device_kinds, list_protocols};

pub use api::{
    ApiError, ControlAction, ControlRequest, ControlResponse, ConfigurationDocument, HealthResponse, Module,
    PollResponse, SharedState, SimulationQuery, SimulationState, create_shared_state, handle_control,
    handle_get_configuration, handle_health, handle_list_devices, handle_poll, print_api_docs,
};

pub use server::build_router;
