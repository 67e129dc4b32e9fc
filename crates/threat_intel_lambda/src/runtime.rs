pub use threat_intel_core::{contract, error, identity, settings, storage_keys};
