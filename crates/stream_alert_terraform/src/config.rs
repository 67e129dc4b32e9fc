use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_SNS_MONITORING_TOPIC: &str = "stream_alert_monitoring";
pub const DEFAULT_TFSTATE_S3_KEY: &str = "stream_alert_state/terraform.tfstate";
pub const DEFAULT_FIREHOSE_BUCKET_SUFFIX: &str = "streamalert.data";
pub const DEFAULT_FIREHOSE_BUFFER_SIZE: u64 = 64;
pub const DEFAULT_FIREHOSE_BUFFER_INTERVAL: u64 = 300;
pub const DEFAULT_FIREHOSE_COMPRESSION: &str = "GZIP";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamAlertConfig {
    pub global: GlobalConfig,
    pub lambda: LambdaConfig,
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    pub account: AccountConfig,
    pub terraform: TerraformConfig,
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountConfig {
    pub aws_account_id: String,
    pub region: String,
    pub prefix: String,
    pub kms_key_alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerraformConfig {
    pub tfstate_bucket: String,
    #[serde(default = "default_tfstate_s3_key")]
    pub tfstate_s3_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InfrastructureConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<MonitoringConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firehose: Option<FirehoseConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub create_sns_topic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sns_topic_name: Option<String>,
}

impl MonitoringConfig {
    /// Name of the SNS topic that monitoring alarms and dead letters go to.
    pub fn topic_name(&self) -> &str {
        if self.create_sns_topic {
            return DEFAULT_SNS_MONITORING_TOPIC;
        }
        self.sns_topic_name
            .as_deref()
            .unwrap_or(DEFAULT_SNS_MONITORING_TOPIC)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FirehoseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_bucket_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LambdaConfig {
    pub rule_processor_config: LambdaSourceConfig,
    pub alert_processor_config: LambdaSourceConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_intel_downloader_config: Option<ThreatIntelDownloaderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LambdaSourceConfig {
    pub source_bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_object_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatIntelDownloaderConfig {
    pub handler: String,
    pub source_bucket: String,
    pub source_object_key: String,
    pub current_version: FunctionVersion,
    #[serde(default = "default_downloader_memory")]
    pub memory: u32,
    #[serde(default = "default_downloader_timeout")]
    pub timeout: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_downloader_interval")]
    pub interval: String,
    #[serde(default = "default_table_capacity")]
    pub table_rcu: u32,
    #[serde(default = "default_table_capacity")]
    pub table_wcu: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ioc_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ioc_filters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ioc_types: Option<Vec<String>>,
}

/// A published Lambda version number or an alias such as `$LATEST`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FunctionVersion {
    Published(u64),
    Alias(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterConfig {
    pub region: String,
    pub modules: ClusterModules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<ClusterOutputs>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterOutputs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinesis: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterModules {
    pub stream_alert: StreamAlertModule,
    pub kinesis: KinesisModule,
    pub kinesis_events: ToggleModule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudwatch_monitoring: Option<ToggleModule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudtrail: Option<CloudtrailConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_logs: Option<FlowLogsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_events: Option<S3EventsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleModule {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamAlertModule {
    pub rule_processor: RuleProcessorConfig,
    pub alert_processor: AlertProcessorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessorSettings {
    pub memory: u32,
    pub timeout: u32,
    pub current_version: FunctionVersion,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleProcessorConfig {
    #[serde(flatten)]
    pub settings: ProcessorSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<RuleProcessorInputs>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleProcessorInputs {
    #[serde(rename = "aws-sns", default, skip_serializing_if = "Option::is_none")]
    pub aws_sns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertProcessorConfig {
    #[serde(flatten)]
    pub settings: ProcessorSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<AlertProcessorOutputs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_config: Option<VpcConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertProcessorOutputs {
    #[serde(rename = "aws-lambda", default, skip_serializing_if = "Option::is_none")]
    pub aws_lambda: Option<Vec<String>>,
    #[serde(rename = "aws-s3", default, skip_serializing_if = "Option::is_none")]
    pub aws_s3: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VpcConfig {
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KinesisModule {
    pub streams: KinesisStreamsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KinesisStreamsConfig {
    pub shards: u32,
    pub retention: u32,
    #[serde(default = "default_true")]
    pub create_user: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trusted_accounts: Vec<String>,
}

/// Cluster CloudTrail settings.
///
/// Older configs carry a bare `enabled` flag; [`CloudtrailConfig::normalize_legacy`]
/// rewrites that into the `enable_logging`/`enable_kinesis` pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CloudtrailConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_logging: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_kinesis: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_trail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_global_trail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_pattern: Option<EventPattern>,
}

impl CloudtrailConfig {
    /// Replaces the legacy `enabled` flag with its canonical pair.
    ///
    /// The legacy flag never disabled anything on its own, so both canonical
    /// flags default to `true` whatever its value. Explicit canonical flags
    /// are kept. Returns `true` when the section changed and needs to be
    /// written back.
    pub fn normalize_legacy(&mut self) -> bool {
        if self.enabled.take().is_none() {
            return false;
        }
        self.enable_logging.get_or_insert(true);
        self.enable_kinesis.get_or_insert(true);
        true
    }

    pub fn logging_enabled(&self) -> bool {
        self.enable_logging.unwrap_or(true)
    }

    pub fn kinesis_enabled(&self) -> bool {
        self.enable_kinesis.unwrap_or(true)
    }
}

/// CloudWatch event pattern, either already serialized or as a JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EventPattern {
    Serialized(String),
    Structured(Map<String, Value>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowLogsConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpcs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enis: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum S3EventsConfig {
    Buckets(Vec<S3EventBucket>),
    Legacy { s3_bucket_id: String },
}

impl S3EventsConfig {
    /// Converts the single-bucket legacy form into a one-element list.
    ///
    /// Returns `true` when the section changed and needs to be written back.
    pub fn normalize_legacy(&mut self) -> bool {
        let Self::Legacy { s3_bucket_id } = self else {
            return false;
        };
        let bucket_id = std::mem::take(s3_bucket_id);
        *self = Self::Buckets(vec![S3EventBucket::new(bucket_id)]);
        true
    }

    pub fn buckets(&self) -> Vec<S3EventBucket> {
        match self {
            Self::Buckets(buckets) => buckets.clone(),
            Self::Legacy { s3_bucket_id } => vec![S3EventBucket::new(s3_bucket_id.clone())],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3EventBucket {
    pub bucket_id: String,
    #[serde(default = "default_true")]
    pub enable_events: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_suffix: Option<String>,
}

impl S3EventBucket {
    pub fn new(bucket_id: impl Into<String>) -> Self {
        Self {
            bucket_id: bucket_id.into(),
            enable_events: true,
            filter_prefix: None,
            filter_suffix: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tfstate_s3_key() -> String {
    DEFAULT_TFSTATE_S3_KEY.to_string()
}

fn default_downloader_memory() -> u32 {
    128
}

fn default_downloader_timeout() -> u32 {
    60
}

fn default_downloader_interval() -> String {
    "rate(1 day)".to_string()
}

fn default_table_capacity() -> u32 {
    10
}
