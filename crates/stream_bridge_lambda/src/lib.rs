//! AWS-oriented adapters and handlers for publishing DynamoDB stream changes
//! to EventBridge.
//!
//! This crate owns runtime integration details (Lambda handler, EventBridge
//! sink, environment configuration and logging). Decoding and batch planning
//! live in `stream_bridge_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
