//! HTTP surface: axum handlers, auth middleware, and process setup.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
