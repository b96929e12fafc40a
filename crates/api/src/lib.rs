//! HTTP API: configuration, routing, session cookie handling and the gate middleware.

pub mod app;
pub mod config;
pub mod context;
pub mod cookie;
pub mod middleware;
