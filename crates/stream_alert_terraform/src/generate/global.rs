use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::logging_bucket_name;
use crate::config::{
    StreamAlertConfig, DEFAULT_FIREHOSE_BUCKET_SUFFIX, DEFAULT_FIREHOSE_BUFFER_INTERVAL,
    DEFAULT_FIREHOSE_BUFFER_SIZE, DEFAULT_FIREHOSE_COMPRESSION, DEFAULT_SNS_MONITORING_TOPIC,
};
use crate::tree::{tree_value, ConfigTree};

pub const AWS_PROVIDER_VERSION: &str = "~> 0.1.4";
pub const TERRAFORM_REQUIRED_VERSION: &str = "~> 0.10.6";
pub const LOCAL_STATE_PATH: &str = "terraform.tfstate";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BucketAcl {
    #[default]
    Private,
    LogDeliveryWrite,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Versioning {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketLogging {
    pub target_bucket: String,
    pub target_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleRule {
    pub prefix: String,
    pub enabled: bool,
    pub transition: LifecycleTransition,
}

/// Storage classes are passed through as written; Terraform validates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifecycleTransition {
    pub days: u32,
    pub storage_class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Bucket {
    pub bucket: String,
    pub acl: BucketAcl,
    pub force_destroy: bool,
    pub versioning: Versioning,
    pub logging: BucketLogging,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_rule: Option<LifecycleRule>,
}

impl S3Bucket {
    pub fn with_acl(mut self, acl: BucketAcl) -> Self {
        self.acl = acl;
        self
    }
}

/// Declares a private, versioned bucket that ships access logs to `logging`
/// under a `<bucket>/` prefix.
pub fn generate_s3_bucket(
    bucket: &str,
    logging: &str,
    force_destroy: bool,
    lifecycle_rule: Option<LifecycleRule>,
) -> S3Bucket {
    S3Bucket {
        bucket: bucket.to_string(),
        acl: BucketAcl::Private,
        force_destroy,
        versioning: Versioning { enabled: true },
        logging: BucketLogging {
            target_bucket: logging.to_string(),
            target_prefix: format!("{bucket}/"),
        },
        lifecycle_rule,
    }
}

/// Builds `main.tf.json`: provider, backend, KMS, the core buckets and the
/// optional Firehose module.
///
/// With `init` set the state stays local, because the remote state bucket is
/// one of the resources this document creates.
pub fn generate_main(config: &StreamAlertConfig, init: bool) -> ConfigTree {
    let account = &config.global.account;
    let infrastructure = &config.global.infrastructure;
    let mut tree = ConfigTree::new();

    tree.set(&["provider", "aws"], json!({"version": AWS_PROVIDER_VERSION}));
    tree.set(
        &["terraform", "required_version"],
        json!(TERRAFORM_REQUIRED_VERSION),
    );

    if init {
        tree.set(
            &["terraform", "backend", "local"],
            json!({"path": LOCAL_STATE_PATH}),
        );
    } else {
        tree.set(
            &["terraform", "backend", "s3"],
            json!({
                "bucket": format!("{}.streamalert.terraform.state", account.prefix),
                "key": config.global.terraform.tfstate_s3_key,
                "region": account.region,
                "encrypt": true,
                "acl": "private",
                "kms_key_id": format!("alias/{}", account.kms_key_alias),
            }),
        );
    }

    tree.set_resource(
        "aws_kms_key",
        "stream_alert_secrets",
        json!({
            "enable_key_rotation": true,
            "description": "StreamAlert secret management",
        }),
    );
    tree.set_resource(
        "aws_kms_alias",
        "stream_alert_secrets",
        json!({
            "name": format!("alias/{}", account.kms_key_alias),
            "target_key_id": "${aws_kms_key.stream_alert_secrets.key_id}",
        }),
    );

    let logging_bucket = logging_bucket_name(&account.prefix);
    let logging_lifecycle = LifecycleRule {
        prefix: "/".to_string(),
        enabled: true,
        transition: LifecycleTransition {
            days: 30,
            storage_class: "GLACIER".to_string(),
        },
    };
    let buckets = [
        (
            "lambda_source",
            generate_s3_bucket(
                &config.lambda.rule_processor_config.source_bucket,
                &logging_bucket,
                true,
                None,
            ),
        ),
        (
            "stream_alert_secrets",
            generate_s3_bucket(
                &format!("{}.streamalert.secrets", account.prefix),
                &logging_bucket,
                true,
                None,
            ),
        ),
        (
            "terraform_remote_state",
            generate_s3_bucket(
                &config.global.terraform.tfstate_bucket,
                &logging_bucket,
                true,
                None,
            ),
        ),
        (
            "logging_bucket",
            generate_s3_bucket(
                &logging_bucket,
                &logging_bucket,
                true,
                Some(logging_lifecycle),
            )
            .with_acl(BucketAcl::LogDeliveryWrite),
        ),
        (
            "streamalerts",
            generate_s3_bucket(
                &format!("{}.streamalerts", account.prefix),
                &logging_bucket,
                true,
                None,
            ),
        ),
    ];
    for (name, bucket) in buckets {
        tree.set_resource("aws_s3_bucket", name, tree_value(bucket));
    }

    if infrastructure
        .monitoring
        .as_ref()
        .is_some_and(|monitoring| monitoring.create_sns_topic)
    {
        tree.set_resource(
            "aws_sns_topic",
            DEFAULT_SNS_MONITORING_TOPIC,
            json!({"name": DEFAULT_SNS_MONITORING_TOPIC}),
        );
    }

    if let Some(firehose) = infrastructure.firehose.as_ref().filter(|f| f.enabled) {
        let suffix = firehose
            .s3_bucket_suffix
            .as_deref()
            .unwrap_or(DEFAULT_FIREHOSE_BUCKET_SUFFIX);
        tree.set_module(
            "kinesis_firehose",
            json!({
                "source": "modules/tf_stream_alert_kinesis_firehose",
                "account_id": account.aws_account_id,
                "region": account.region,
                "prefix": account.prefix,
                "logs": firehose.enabled_logs,
                "buffer_size": firehose.buffer_size.unwrap_or(DEFAULT_FIREHOSE_BUFFER_SIZE),
                "buffer_interval": firehose
                    .buffer_interval
                    .unwrap_or(DEFAULT_FIREHOSE_BUFFER_INTERVAL),
                "compression_format": firehose
                    .compression_format
                    .as_deref()
                    .unwrap_or(DEFAULT_FIREHOSE_COMPRESSION),
                "s3_logging_bucket": logging_bucket,
                "s3_bucket_name": format!("{}.{}", account.prefix, suffix),
            }),
        );
    }

    debug!(init, "generated main terraform");
    tree
}
