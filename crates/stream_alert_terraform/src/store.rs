use serde_json::Value;

use crate::config::StreamAlertConfig;
use crate::error::ConfigStoreError;

/// Access to the loaded configuration with explicit write-through.
///
/// Edits made through [`ConfigStore::config_mut`] are visible immediately.
/// They survive [`ConfigStore::load`] only after [`ConfigStore::write`].
pub trait ConfigStore {
    fn config(&self) -> &StreamAlertConfig;
    fn config_mut(&mut self) -> &mut StreamAlertConfig;
    fn write(&mut self) -> Result<(), ConfigStoreError>;
    fn load(&mut self) -> Result<(), ConfigStoreError>;
}

/// Keeps the persisted form as a JSON document, the same shape a file-backed
/// store would hold on disk.
#[derive(Debug, Clone)]
pub struct MemoryConfigStore {
    persisted: Value,
    current: StreamAlertConfig,
}

impl MemoryConfigStore {
    pub fn new(config: StreamAlertConfig) -> Result<Self, ConfigStoreError> {
        let persisted = serde_json::to_value(&config).map_err(ConfigStoreError::Encode)?;
        Ok(Self {
            persisted,
            current: config,
        })
    }

    pub fn from_value(document: Value) -> Result<Self, ConfigStoreError> {
        let current = serde_json::from_value(document.clone()).map_err(ConfigStoreError::Decode)?;
        Ok(Self {
            persisted: document,
            current,
        })
    }

    /// The last written document.
    pub fn persisted(&self) -> &Value {
        &self.persisted
    }
}

impl ConfigStore for MemoryConfigStore {
    fn config(&self) -> &StreamAlertConfig {
        &self.current
    }

    fn config_mut(&mut self) -> &mut StreamAlertConfig {
        &mut self.current
    }

    fn write(&mut self) -> Result<(), ConfigStoreError> {
        self.persisted = serde_json::to_value(&self.current).map_err(ConfigStoreError::Encode)?;
        Ok(())
    }

    fn load(&mut self) -> Result<(), ConfigStoreError> {
        self.current =
            serde_json::from_value(self.persisted.clone()).map_err(ConfigStoreError::Decode)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ToggleModule;
    use crate::test_helpers::unit_test_config;

    #[test]
    fn load_discards_unwritten_edits() {
        let mut store = MemoryConfigStore::new(unit_test_config()).expect("store should build");
        store
            .config_mut()
            .global
            .account
            .prefix
            .push_str("-changed");

        store.load().expect("reload should succeed");
        assert_eq!(store.config().global.account.prefix, "unit-testing");
    }

    #[test]
    fn written_edits_survive_reload() {
        let mut store = MemoryConfigStore::new(unit_test_config()).expect("store should build");
        store
            .config_mut()
            .clusters
            .get_mut("test")
            .expect("test cluster should exist")
            .modules
            .cloudwatch_monitoring = Some(ToggleModule { enabled: false });

        store.write().expect("write should succeed");
        store.load().expect("reload should succeed");

        assert_eq!(
            store.persisted()["clusters"]["test"]["modules"]["cloudwatch_monitoring"],
            json!({"enabled": false})
        );
        assert_eq!(
            store.config().clusters["test"].modules.cloudwatch_monitoring,
            Some(ToggleModule { enabled: false })
        );
    }

    #[test]
    fn from_value_rejects_incomplete_document() {
        let error = MemoryConfigStore::from_value(json!({"global": {}}))
            .expect_err("document without lambda section should fail");
        assert!(matches!(error, ConfigStoreError::Decode(_)));
    }
}
