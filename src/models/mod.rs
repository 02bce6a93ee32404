//! Response models for the diagnostics API
//!
//! DTOs serialized into the HTTP response bodies.

pub mod responses;

pub use responses::{
    DomainStatsResponse, ErrorResponse, HealthResponse, InvalidateResponse, ResetResponse,
    StatsResponse,
};
