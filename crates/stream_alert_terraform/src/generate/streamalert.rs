use serde_json::{json, Value};

use super::cluster_config;
use crate::config::{ProcessorSettings, StreamAlertConfig};
use crate::error::GenerateError;
use crate::tree::ConfigTree;

fn insert_processor(block: &mut Value, processor: &str, settings: &ProcessorSettings) {
    block[format!("{processor}_enable_metrics")] = json!(settings.enable_metrics);
    block[format!("{processor}_log_level")] = json!(settings.log_level);
    block[format!("{processor}_memory")] = json!(settings.memory);
    block[format!("{processor}_timeout")] = json!(settings.timeout);
    block[format!("{processor}_version")] = json!(settings.current_version);
    block[format!("{processor}_config")] = json!(format!("${{var.{processor}_config}}"));
}

/// Writes the `stream_alert_<cluster>` module: both processors plus their
/// optional inputs, outputs and VPC attachment.
pub fn generate_stream_alert(
    cluster_name: &str,
    tree: &mut ConfigTree,
    config: &StreamAlertConfig,
) -> Result<(), GenerateError> {
    let account = &config.global.account;
    let cluster = cluster_config(config, cluster_name)?;
    let rule_processor = &cluster.modules.stream_alert.rule_processor;
    let alert_processor = &cluster.modules.stream_alert.alert_processor;

    let mut block = json!({
        "source": "modules/tf_stream_alert",
        "account_id": account.aws_account_id,
        "region": cluster.region,
        "prefix": account.prefix,
        "cluster": cluster_name,
        "kms_key_arn": "${aws_kms_key.stream_alert_secrets.arn}",
    });
    insert_processor(&mut block, "rule_processor", &rule_processor.settings);
    insert_processor(&mut block, "alert_processor", &alert_processor.settings);

    if let Some(outputs) = &alert_processor.outputs {
        if let Some(functions) = &outputs.aws_lambda {
            block["output_lambda_functions"] = json!(functions);
        }
        if let Some(buckets) = &outputs.aws_s3 {
            block["output_s3_buckets"] = json!(buckets);
        }
    }

    if let Some(topics) = rule_processor
        .inputs
        .as_ref()
        .and_then(|inputs| inputs.aws_sns.as_ref())
    {
        block["input_sns_topics"] = json!(topics);
    }

    if let Some(vpc) = &alert_processor.vpc_config {
        block["alert_processor_vpc_enabled"] = json!(true);
        block["alert_processor_vpc_subnet_ids"] = json!(vpc.subnet_ids);
        block["alert_processor_vpc_security_group_ids"] = json!(vpc.security_group_ids);
    }

    tree.set_module(&format!("stream_alert_{cluster_name}"), block);
    Ok(())
}
