//! Terraform configuration generation for StreamAlert deployments.
//!
//! This crate turns a typed StreamAlert configuration into Terraform JSON
//! trees. It owns no I/O: configuration persistence sits behind
//! [`store::ConfigStore`] and the generated [`tree::ConfigTree`] is handed to
//! whatever writes `*.tf.json` files and drives `terraform`.

pub mod config;
pub mod error;
pub mod generate;
pub mod json_compat;
pub mod store;
pub mod tree;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use error::{ConfigStoreError, GenerateError};
pub use generate::{generate_cluster, generate_main, generate_s3_bucket};
pub use store::{ConfigStore, MemoryConfigStore};
pub use tree::ConfigTree;
