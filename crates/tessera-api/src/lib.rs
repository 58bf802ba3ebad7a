//! Tessera API
//!
//! HTTP surface for upload ticket redemption: the redemption endpoint, health
//! probes, the OpenAPI document and the expired-ticket sweeper.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
