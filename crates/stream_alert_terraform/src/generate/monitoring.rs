use serde_json::json;
use tracing::warn;

use super::{
    alert_processor_function_name, cluster_config, kinesis_stream_name,
    rule_processor_function_name,
};
use crate::config::{StreamAlertConfig, DEFAULT_SNS_MONITORING_TOPIC};
use crate::error::GenerateError;
use crate::tree::ConfigTree;

pub fn generate_cloudwatch_monitoring(
    cluster_name: &str,
    tree: &mut ConfigTree,
    config: &StreamAlertConfig,
) -> Result<(), GenerateError> {
    let account = &config.global.account;
    let cluster = cluster_config(config, cluster_name)?;

    let topic = match &config.global.infrastructure.monitoring {
        Some(monitoring) => monitoring.topic_name(),
        None => {
            warn!(
                cluster = cluster_name,
                "no global monitoring settings, alarms go to the default topic"
            );
            DEFAULT_SNS_MONITORING_TOPIC
        }
    };

    tree.set_module(
        &format!("cloudwatch_monitoring_{cluster_name}"),
        json!({
            "source": "modules/tf_stream_alert_monitoring",
            "sns_topic_arn": format!(
                "arn:aws:sns:{}:{}:{topic}",
                cluster.region, account.aws_account_id
            ),
            "lambda_functions": [
                rule_processor_function_name(&account.prefix, cluster_name),
                alert_processor_function_name(&account.prefix, cluster_name),
            ],
            "kinesis_stream": kinesis_stream_name(&account.prefix, cluster_name),
        }),
    );
    Ok(())
}
