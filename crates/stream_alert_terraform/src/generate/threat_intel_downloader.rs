use serde_json::json;

use crate::config::{StreamAlertConfig, DEFAULT_SNS_MONITORING_TOPIC};
use crate::tree::ConfigTree;

/// Builds the `threat_intel_downloader` module document, or `None` when the
/// downloader Lambda is not configured.
///
/// The monitoring topic doubles as the function's dead letter queue.
pub fn generate_threat_intel_downloader(config: &StreamAlertConfig) -> Option<ConfigTree> {
    let downloader = config.lambda.threat_intel_downloader_config.as_ref()?;
    let account = &config.global.account;
    let dlq_topic = config
        .global
        .infrastructure
        .monitoring
        .as_ref()
        .map_or(DEFAULT_SNS_MONITORING_TOPIC, |monitoring| monitoring.topic_name());

    let mut block = json!({
        "account_id": account.aws_account_id,
        "region": account.region,
        "source": "modules/tf_threat_intel_downloader",
        "lambda_handler": downloader.handler,
        "lambda_memory": downloader.memory,
        "lambda_timeout": downloader.timeout,
        "lambda_s3_bucket": downloader.source_bucket,
        "lambda_s3_key": downloader.source_object_key,
        "lambda_log_level": downloader.log_level,
        "interval": downloader.interval,
        "current_version": downloader.current_version,
        "prefix": account.prefix,
        "monitoring_sns_topic": dlq_topic,
        "table_rcu": downloader.table_rcu,
        "table_wcu": downloader.table_wcu,
    });
    for (key, values) in [
        ("ioc_keys", &downloader.ioc_keys),
        ("ioc_filters", &downloader.ioc_filters),
        ("ioc_types", &downloader.ioc_types),
    ] {
        if let Some(values) = values {
            block[key] = json!(values);
        }
    }

    let mut tree = ConfigTree::new();
    tree.set_module("threat_intel_downloader", block);
    Some(tree)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::MonitoringConfig;
    use crate::test_helpers::unit_test_config;

    #[test]
    fn module_uses_configured_values_and_defaults() {
        let tree = generate_threat_intel_downloader(&unit_test_config())
            .expect("downloader should be configured");

        assert_eq!(
            tree.module("threat_intel_downloader"),
            Some(&json!({
                "account_id": "12345678910",
                "region": "us-west-1",
                "source": "modules/tf_threat_intel_downloader",
                "lambda_handler": "main.handler",
                "lambda_memory": 128,
                "lambda_timeout": 120,
                "lambda_s3_bucket": "unit.testing.source.bucket",
                "lambda_s3_key": "lambda/threat_intel_downloader.zip",
                "lambda_log_level": "info",
                "interval": "rate(1 day)",
                "current_version": "$LATEST",
                "prefix": "unit-testing",
                "monitoring_sns_topic": "stream_alert_monitoring",
                "table_rcu": 10,
                "table_wcu": 10,
                "ioc_types": ["domain", "ip", "md5"]
            }))
        );
    }

    #[test]
    fn dead_letter_topic_follows_existing_monitoring_topic() {
        let mut config = unit_test_config();
        config.global.infrastructure.monitoring = Some(MonitoringConfig {
            create_sns_topic: false,
            sns_topic_name: Some("existing_topic".to_string()),
        });

        let tree =
            generate_threat_intel_downloader(&config).expect("downloader should be configured");
        assert_eq!(
            tree.get(&["module", "threat_intel_downloader", "monitoring_sns_topic"]),
            Some(&json!("existing_topic"))
        );
    }

    #[test]
    fn missing_downloader_config_generates_nothing() {
        let mut config = unit_test_config();
        config.lambda.threat_intel_downloader_config = None;

        assert!(generate_threat_intel_downloader(&config).is_none());
    }
}
