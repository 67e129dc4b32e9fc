use serde_json::json;

use super::{cluster_config, kinesis_stream_name, module_reference};
use crate::config::StreamAlertConfig;
use crate::error::GenerateError;
use crate::tree::ConfigTree;

/// Writes `kinesis_<cluster>` and one `output` per configured stream output.
pub fn generate_kinesis_streams(
    cluster_name: &str,
    tree: &mut ConfigTree,
    config: &StreamAlertConfig,
) -> Result<(), GenerateError> {
    let account = &config.global.account;
    let cluster = cluster_config(config, cluster_name)?;
    let streams = &cluster.modules.kinesis.streams;
    let module_name = format!("kinesis_{cluster_name}");

    let mut block = json!({
        "source": "modules/tf_stream_alert_kinesis_streams",
        "account_id": account.aws_account_id,
        "region": cluster.region,
        "cluster_name": cluster_name,
        "stream_name": kinesis_stream_name(&account.prefix, cluster_name),
        "shards": streams.shards,
        "retention": streams.retention,
        "create_user": streams.create_user,
    });
    if !streams.trusted_accounts.is_empty() {
        block["trusted_accounts"] = json!(streams.trusted_accounts);
    }
    tree.set_module(&module_name, block);

    if let Some(outputs) = &cluster.outputs {
        for output in &outputs.kinesis {
            tree.set_output(
                &format!("{module_name}_{output}"),
                json!({"value": module_reference(&module_name, output)}),
            );
        }
    }
    Ok(())
}

/// Writes `kinesis_events_<cluster>`, the event source mapping from the
/// cluster stream to its rule processor.
pub fn generate_kinesis_events(
    cluster_name: &str,
    tree: &mut ConfigTree,
    config: &StreamAlertConfig,
) -> Result<(), GenerateError> {
    let cluster = cluster_config(config, cluster_name)?;
    let stream_alert_module = format!("stream_alert_{cluster_name}");

    tree.set_module(
        &format!("kinesis_events_{cluster_name}"),
        json!({
            "source": "modules/tf_stream_alert_kinesis_events",
            "lambda_production_enabled": cluster.modules.kinesis_events.enabled,
            "lambda_role_id": module_reference(&stream_alert_module, "lambda_role_id"),
            "lambda_function_arn": module_reference(&stream_alert_module, "lambda_arn"),
            "kinesis_stream_arn": module_reference(&format!("kinesis_{cluster_name}"), "arn"),
            "role_policy_prefix": cluster_name,
        }),
    );
    Ok(())
}
