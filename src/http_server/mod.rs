//! # HTTP Server Module
//!
//! Axum server exposing set execution over HTTP.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /v1/sets` - Registered set names
//! - `POST /v1/sets/:name/exec` - Execute a set
//! - `GET /metrics` - Execution counters

pub mod config;
pub mod exec_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use exec_routes::{exec_routes, ExecRequest, ExecState, REQUEST_ID_HEADER};
pub use server::{HealthResponse, HttpServer};
