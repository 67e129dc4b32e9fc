//! Terraform generators.
//!
//! Every generator writes under its own key (`stream_alert_<cluster>`,
//! `kinesis_<cluster>`, ...) so running them against one [`ConfigTree`] never
//! overwrites another generator's block.

mod cloudtrail;
mod flow_logs;
mod global;
mod kinesis;
mod monitoring;
mod s3_events;
mod streamalert;
mod threat_intel_downloader;

use tracing::debug;

pub use cloudtrail::generate_cloudtrail;
pub use flow_logs::generate_flow_logs;
pub use global::{
    generate_main, generate_s3_bucket, BucketAcl, BucketLogging, LifecycleRule,
    LifecycleTransition, S3Bucket, Versioning,
};
pub use kinesis::{generate_kinesis_events, generate_kinesis_streams};
pub use monitoring::generate_cloudwatch_monitoring;
pub use s3_events::generate_s3_events;
pub use streamalert::generate_stream_alert;
pub use threat_intel_downloader::generate_threat_intel_downloader;

use crate::config::{ClusterConfig, StreamAlertConfig};
use crate::error::GenerateError;
use crate::store::ConfigStore;
use crate::tree::ConfigTree;

/// Builds the Terraform document for one cluster.
///
/// The result always has exactly the `module` and `output` top-level keys.
/// Generators that normalize legacy settings write them back through `store`.
pub fn generate_cluster(
    store: &mut dyn ConfigStore,
    cluster_name: &str,
) -> Result<ConfigTree, GenerateError> {
    let mut tree = ConfigTree::for_cluster();

    let (monitoring_enabled, flow_logs_configured, cloudtrail_configured, s3_events_configured) = {
        let config = store.config();
        let modules = &cluster_config(config, cluster_name)?.modules;

        generate_stream_alert(cluster_name, &mut tree, config)?;
        (
            modules
                .cloudwatch_monitoring
                .as_ref()
                .is_some_and(|module| module.enabled),
            modules.flow_logs.is_some(),
            modules.cloudtrail.is_some(),
            modules.s3_events.is_some(),
        )
    };

    if monitoring_enabled {
        generate_cloudwatch_monitoring(cluster_name, &mut tree, store.config())?;
    }
    generate_kinesis_streams(cluster_name, &mut tree, store.config())?;
    generate_kinesis_events(cluster_name, &mut tree, store.config())?;

    if flow_logs_configured {
        generate_flow_logs(cluster_name, &mut tree, store.config())?;
    }
    if cloudtrail_configured {
        generate_cloudtrail(cluster_name, &mut tree, store)?;
    }
    if s3_events_configured {
        generate_s3_events(cluster_name, &mut tree, store)?;
    }

    debug!(
        cluster = cluster_name,
        modules = tree.module_names().len(),
        "generated cluster terraform"
    );
    Ok(tree)
}

pub fn logging_bucket_name(prefix: &str) -> String {
    format!("{prefix}.streamalert.s3-logging")
}

pub(crate) fn rule_processor_function_name(prefix: &str, cluster_name: &str) -> String {
    format!("{prefix}_{cluster_name}_streamalert_rule_processor")
}

pub(crate) fn alert_processor_function_name(prefix: &str, cluster_name: &str) -> String {
    format!("{prefix}_{cluster_name}_streamalert_alert_processor")
}

pub(crate) fn kinesis_stream_name(prefix: &str, cluster_name: &str) -> String {
    format!("{prefix}_{cluster_name}_stream_alert_kinesis")
}

pub(crate) fn module_reference(module: &str, attribute: &str) -> String {
    format!("${{module.{module}.{attribute}}}")
}

pub(crate) fn cluster_config<'a>(
    config: &'a StreamAlertConfig,
    cluster_name: &str,
) -> Result<&'a ClusterConfig, GenerateError> {
    config
        .clusters
        .get(cluster_name)
        .ok_or_else(|| GenerateError::UnknownCluster(cluster_name.to_string()))
}

pub(crate) fn cluster_config_mut<'a>(
    config: &'a mut StreamAlertConfig,
    cluster_name: &str,
) -> Result<&'a mut ClusterConfig, GenerateError> {
    config
        .clusters
        .get_mut(cluster_name)
        .ok_or_else(|| GenerateError::UnknownCluster(cluster_name.to_string()))
}
