//! HTTP API surface: wire models and route handlers.

pub mod handlers;
pub mod models;
