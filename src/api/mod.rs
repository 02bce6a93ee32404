//! API Module
//!
//! HTTP handlers and routing for the cache diagnostics server.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Per-domain cache statistics
//! - `POST /stats/reset` - Reset cache statistics
//! - `POST /invalidate/:domain` - Flush one domain cache

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
