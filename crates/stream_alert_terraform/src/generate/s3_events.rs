use serde_json::json;
use tracing::{error, info};

use super::{cluster_config_mut, module_reference, rule_processor_function_name};
use crate::error::GenerateError;
use crate::store::ConfigStore;
use crate::tree::ConfigTree;

/// Writes one `s3_events_<prefix>_<cluster>_<index>` module per bucket that
/// notifies the cluster's rule processor. Indexes start at 0 and follow the
/// configured bucket order.
pub fn generate_s3_events(
    cluster_name: &str,
    tree: &mut ConfigTree,
    store: &mut dyn ConfigStore,
) -> Result<(), GenerateError> {
    let (buckets, converted) = {
        let cluster = cluster_config_mut(store.config_mut(), cluster_name)?;
        let Some(section) = cluster.modules.s3_events.as_mut() else {
            return Ok(());
        };
        let converted = section.normalize_legacy();
        (section.buckets(), converted)
    };

    if converted {
        info!(cluster = cluster_name, "converting legacy s3 events config");
        store.write()?;
    }

    if let Some(index) = buckets
        .iter()
        .position(|bucket| bucket.bucket_id.trim().is_empty())
    {
        error!(cluster = cluster_name, index, "s3_events entry is missing bucket_id");
        return Err(GenerateError::MissingBucketId {
            cluster: cluster_name.to_string(),
            index,
        });
    }

    let prefix = &store.config().global.account.prefix;
    let stream_alert_module = format!("stream_alert_{cluster_name}");
    for (index, bucket) in buckets.iter().enumerate() {
        let mut block = json!({
            "source": "modules/tf_stream_alert_s3_events",
            "lambda_function_arn": module_reference(&stream_alert_module, "lambda_arn"),
            "lambda_function_name": rule_processor_function_name(prefix, cluster_name),
            "lambda_role_id": module_reference(&stream_alert_module, "lambda_role_id"),
            "role_policy_prefix": cluster_name,
            "bucket_id": bucket.bucket_id,
            "enable_events": bucket.enable_events,
        });
        if let Some(filter_prefix) = &bucket.filter_prefix {
            block["filter_prefix"] = json!(filter_prefix);
        }
        if let Some(filter_suffix) = &bucket.filter_suffix {
            block["filter_suffix"] = json!(filter_suffix);
        }
        tree.set_module(&format!("s3_events_{prefix}_{cluster_name}_{index}"), block);
    }
    Ok(())
}
