use serde_json::{json, Map, Value};
use tracing::{error, info};

use super::{cluster_config_mut, logging_bucket_name, module_reference};
use crate::config::EventPattern;
use crate::error::GenerateError;
use crate::json_compat::to_spaced_string;
use crate::store::ConfigStore;
use crate::tree::ConfigTree;

/// Pattern keys in the order they are rendered.
const EVENT_PATTERN_KEYS: [&str; 3] = ["source", "account", "detail"];

fn render_event_pattern(
    pattern: Option<&EventPattern>,
    account_id: &str,
) -> Result<String, String> {
    let fields = match pattern {
        None => return render(&json!({"account": [account_id]})),
        Some(EventPattern::Serialized(text)) => return Ok(text.clone()),
        Some(EventPattern::Structured(fields)) => fields,
    };

    if let Some(unknown) = fields
        .keys()
        .find(|key| !EVENT_PATTERN_KEYS.contains(&key.as_str()))
    {
        return Err(format!("unsupported key '{unknown}'"));
    }

    let mut canonical = Map::new();
    for key in EVENT_PATTERN_KEYS {
        if let Some(value) = fields.get(key) {
            canonical.insert(key.to_string(), value.clone());
        }
    }
    if canonical.is_empty() {
        return Err("pattern must set at least one of source, account, detail".to_string());
    }
    render(&Value::Object(canonical))
}

fn render(value: &Value) -> Result<String, String> {
    to_spaced_string(value).map_err(|error| error.to_string())
}

/// Writes `cloudtrail_<cluster>`.
///
/// A legacy `{enabled: ..}` section is rewritten to the
/// `enable_logging`/`enable_kinesis` pair and written back through `store`
/// first. An invalid event pattern leaves `tree` untouched.
pub fn generate_cloudtrail(
    cluster_name: &str,
    tree: &mut ConfigTree,
    store: &mut dyn ConfigStore,
) -> Result<(), GenerateError> {
    let (section, converted) = {
        let cluster = cluster_config_mut(store.config_mut(), cluster_name)?;
        let Some(section) = cluster.modules.cloudtrail.as_mut() else {
            info!(cluster = cluster_name, "cloudtrail not configured, nothing to do");
            return Ok(());
        };
        let converted = section.normalize_legacy();
        (section.clone(), converted)
    };

    if converted {
        info!(cluster = cluster_name, "converting legacy cloudtrail config");
        store.write()?;
    }

    let account = &store.config().global.account;
    let event_pattern =
        render_event_pattern(section.event_pattern.as_ref(), &account.aws_account_id).map_err(
            |reason| {
                error!(cluster = cluster_name, %reason, "invalid cloudwatch event pattern");
                GenerateError::InvalidEventPattern {
                    cluster: cluster_name.to_string(),
                    reason,
                }
            },
        )?;

    let mut block = json!({
        "source": "modules/tf_stream_alert_cloudtrail",
        "account_ids": [account.aws_account_id],
        "cluster": cluster_name,
        "prefix": account.prefix,
        "enable_logging": section.logging_enabled(),
        "enable_kinesis": section.kinesis_enabled(),
        "s3_logging_bucket": logging_bucket_name(&account.prefix),
        "existing_trail": section.existing_trail.unwrap_or(false),
        "is_global_trail": section.is_global_trail.unwrap_or(true),
        "event_pattern": event_pattern,
    });
    if section.kinesis_enabled() {
        block["kinesis_arn"] = json!(module_reference(&format!("kinesis_{cluster_name}"), "arn"));
    }

    tree.set_module(&format!("cloudtrail_{cluster_name}"), block);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io;
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::config::{CloudtrailConfig, StreamAlertConfig};
    use crate::store::MemoryConfigStore;
    use crate::test_helpers::unit_test_store;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("poisoned mutex")).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("poisoned mutex").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn set_cloudtrail(store: &mut MemoryConfigStore, section: serde_json::Value) {
        let section: CloudtrailConfig =
            serde_json::from_value(section).expect("cloudtrail section should parse");
        store
            .config_mut()
            .clusters
            .get_mut("advanced")
            .expect("advanced cluster should exist")
            .modules
            .cloudtrail = Some(section);
    }

    fn cloudtrail_keys(config: &StreamAlertConfig) -> BTreeSet<String> {
        let section = serde_json::to_value(&config.clusters["advanced"].modules.cloudtrail)
            .expect("section should serialize");
        section
            .as_object()
            .expect("section should be an object")
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn legacy_section_is_normalized_and_persisted() {
        let mut store = unit_test_store();
        set_cloudtrail(&mut store, json!({"enabled": true}));

        let mut tree = ConfigTree::for_cluster();
        generate_cloudtrail("advanced", &mut tree, &mut store).expect("module should generate");
        store.load().expect("reload should succeed");

        assert_eq!(
            cloudtrail_keys(store.config()),
            BTreeSet::from(["enable_logging".to_string(), "enable_kinesis".to_string()])
        );
        assert_eq!(
            tree.module("cloudtrail_advanced"),
            Some(&json!({
                "account_ids": ["12345678910"],
                "cluster": "advanced",
                "kinesis_arn": "${module.kinesis_advanced.arn}",
                "prefix": "unit-testing",
                "enable_logging": true,
                "enable_kinesis": true,
                "source": "modules/tf_stream_alert_cloudtrail",
                "s3_logging_bucket": "unit-testing.streamalert.s3-logging",
                "existing_trail": false,
                "is_global_trail": true,
                "event_pattern": "{\"account\": [\"12345678910\"]}"
            }))
        );
    }

    #[test]
    fn structured_pattern_renders_in_canonical_order() {
        let mut store = unit_test_store();
        set_cloudtrail(
            &mut store,
            json!({
                "enable_logging": true,
                "enable_kinesis": true,
                "existing_trail": false,
                "is_global_trail": false,
                "event_pattern": {
                    "detail": {"state": ["running"]},
                    "account": "12345678910",
                    "source": ["aws.ec2"]
                }
            }),
        );

        let mut tree = ConfigTree::for_cluster();
        generate_cloudtrail("advanced", &mut tree, &mut store).expect("module should generate");

        assert_eq!(
            tree.module("cloudtrail_advanced"),
            Some(&json!({
                "account_ids": ["12345678910"],
                "cluster": "advanced",
                "existing_trail": false,
                "is_global_trail": false,
                "kinesis_arn": "${module.kinesis_advanced.arn}",
                "prefix": "unit-testing",
                "enable_logging": true,
                "enable_kinesis": true,
                "source": "modules/tf_stream_alert_cloudtrail",
                "s3_logging_bucket": "unit-testing.streamalert.s3-logging",
                "event_pattern": "{\"source\": [\"aws.ec2\"], \"account\": \"12345678910\", \"detail\": {\"state\": [\"running\"]}}"
            }))
        );
    }

    #[test]
    fn serialized_pattern_passes_through() {
        let mut store = unit_test_store();
        set_cloudtrail(
            &mut store,
            json!({"event_pattern": "{\"source\":[\"aws.s3\"]}"}),
        );

        let mut tree = ConfigTree::for_cluster();
        generate_cloudtrail("advanced", &mut tree, &mut store).expect("module should generate");

        assert_eq!(
            tree.get(&["module", "cloudtrail_advanced", "event_pattern"]),
            Some(&json!("{\"source\":[\"aws.s3\"]}"))
        );
    }

    #[test]
    fn disabled_kinesis_omits_stream_reference() {
        let mut store = unit_test_store();
        set_cloudtrail(&mut store, json!({"enable_logging": true, "enable_kinesis": false}));

        let mut tree = ConfigTree::for_cluster();
        generate_cloudtrail("advanced", &mut tree, &mut store).expect("module should generate");

        let block = tree
            .module("cloudtrail_advanced")
            .expect("cloudtrail module should exist");
        assert_eq!(block["enable_kinesis"], json!(false));
        assert!(block.get("kinesis_arn").is_none());
    }

    #[test]
    fn invalid_pattern_key_fails_without_writing() {
        let mut store = unit_test_store();
        set_cloudtrail(
            &mut store,
            json!({
                "enable_logging": true,
                "enable_kinesis": true,
                "existing_trail": false,
                "is_global_trail": false,
                "event_pattern": {"invalid": ["aws.ec2"]}
            }),
        );

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let mut tree = ConfigTree::for_cluster();
        let result = tracing::subscriber::with_default(subscriber, || {
            generate_cloudtrail("advanced", &mut tree, &mut store)
        });

        let error = result.expect_err("invalid pattern should fail");
        assert!(matches!(error, GenerateError::InvalidEventPattern { .. }));
        assert!(logs.contents().contains("ERROR"));
        assert!(logs.contents().contains("invalid cloudwatch event pattern"));
        assert!(tree.module("cloudtrail_advanced").is_none());
    }

    #[test]
    fn pattern_mixing_known_and_unknown_keys_fails() {
        let mut store = unit_test_store();
        set_cloudtrail(
            &mut store,
            json!({"event_pattern": {"source": ["aws.ec2"], "region": ["us-east-1"]}}),
        );

        let mut tree = ConfigTree::for_cluster();
        let error = generate_cloudtrail("advanced", &mut tree, &mut store)
            .expect_err("unknown key should fail");

        assert!(matches!(
            error,
            GenerateError::InvalidEventPattern { reason, .. } if reason.contains("region")
        ));
        assert!(tree.module_names().is_empty());
    }

    #[test]
    fn empty_structured_pattern_fails() {
        let mut store = unit_test_store();
        set_cloudtrail(&mut store, json!({"event_pattern": {}}));

        let mut tree = ConfigTree::for_cluster();
        let result = generate_cloudtrail("advanced", &mut tree, &mut store);

        assert!(result.is_err());
        assert!(tree.module_names().is_empty());
    }
}
