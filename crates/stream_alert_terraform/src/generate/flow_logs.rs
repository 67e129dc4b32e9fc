use serde_json::json;
use tracing::info;

use super::{cluster_config, module_reference};
use crate::config::StreamAlertConfig;
use crate::error::GenerateError;
use crate::tree::ConfigTree;

/// Writes `flow_logs_<cluster>` when the cluster enables VPC flow logs.
/// VPC, subnet and ENI ids keep their configured order.
pub fn generate_flow_logs(
    cluster_name: &str,
    tree: &mut ConfigTree,
    config: &StreamAlertConfig,
) -> Result<(), GenerateError> {
    let prefix = &config.global.account.prefix;
    let cluster = cluster_config(config, cluster_name)?;
    let Some(flow_logs) = cluster.modules.flow_logs.as_ref().filter(|f| f.enabled) else {
        info!(cluster = cluster_name, "flow logs disabled, nothing to do");
        return Ok(());
    };

    let log_group_name = flow_logs
        .log_group_name
        .clone()
        .unwrap_or_else(|| format!("{prefix}_{cluster_name}_streamalert_flow_logs"));

    let mut block = json!({
        "source": "modules/tf_stream_alert_flow_logs",
        "destination_stream_arn": module_reference(&format!("kinesis_{cluster_name}"), "arn"),
        "flow_log_group_name": log_group_name,
    });
    for (key, ids) in [
        ("vpcs", &flow_logs.vpcs),
        ("subnets", &flow_logs.subnets),
        ("enis", &flow_logs.enis),
    ] {
        if let Some(ids) = ids.as_ref().filter(|ids| !ids.is_empty()) {
            block[key] = json!(ids);
        }
    }

    tree.set_module(&format!("flow_logs_{cluster_name}"), block);
    Ok(())
}
