//! Threat intel downloader domain primitives.
//!
//! This crate owns the continuation contract, identity parsing, settings and
//! storage key rules. It intentionally excludes AWS SDK, HTTP and Lambda
//! runtime concerns.

pub mod contract;
pub mod error;
pub mod identity;
pub mod settings;
pub mod storage_keys;
