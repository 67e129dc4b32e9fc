//! AWS-oriented adapters and handlers for the threat intel downloader.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! ThreatStream client and storage/invoke adapters) and exposes a single
//! runtime module boundary for the contract, identity and settings
//! primitives.

pub mod adapters;
pub mod handlers;
pub mod logging;
pub mod runtime;
pub mod threat_stream;
