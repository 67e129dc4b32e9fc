//! Shared fixtures for generator tests.
//!
//! The config has two clusters: `test` carries only the base modules and
//! `advanced` turns on every optional one.

use serde_json::{json, Value};

use crate::config::StreamAlertConfig;
use crate::store::MemoryConfigStore;

fn processor() -> Value {
    json!({
        "memory": 128,
        "timeout": 25,
        "current_version": "$LATEST"
    })
}

/// The fixture as a raw document, before any typed parsing.
pub fn unit_test_document() -> Value {
    json!({
        "global": {
            "account": {
                "aws_account_id": "12345678910",
                "region": "us-west-1",
                "prefix": "unit-testing",
                "kms_key_alias": "unit-testing"
            },
            "terraform": {
                "tfstate_bucket": "unit-testing.terraform.tfstate"
            },
            "infrastructure": {
                "monitoring": {"create_sns_topic": true}
            }
        },
        "lambda": {
            "rule_processor_config": {"source_bucket": "unit.testing.source.bucket"},
            "alert_processor_config": {"source_bucket": "unit.testing.source.bucket"},
            "threat_intel_downloader_config": {
                "handler": "main.handler",
                "source_bucket": "unit.testing.source.bucket",
                "source_object_key": "lambda/threat_intel_downloader.zip",
                "current_version": "$LATEST",
                "timeout": 120,
                "ioc_types": ["domain", "ip", "md5"]
            }
        },
        "clusters": {
            "test": {
                "region": "us-west-1",
                "modules": {
                    "stream_alert": {
                        "rule_processor": processor(),
                        "alert_processor": processor()
                    },
                    "cloudwatch_monitoring": {"enabled": true},
                    "kinesis": {"streams": {"shards": 1, "retention": 24}},
                    "kinesis_events": {"enabled": true},
                    "s3_events": [{"bucket_id": "unit-test-bucket.data"}]
                },
                "outputs": {"kinesis": ["username", "access_key_id", "secret_key"]}
            },
            "advanced": {
                "region": "us-west-1",
                "modules": {
                    "stream_alert": {
                        "rule_processor": {
                            "memory": 128,
                            "timeout": 25,
                            "current_version": "$LATEST",
                            "inputs": {"aws-sns": ["my-sns-topic-name"]}
                        },
                        "alert_processor": {
                            "memory": 128,
                            "timeout": 25,
                            "current_version": "$LATEST",
                            "outputs": {
                                "aws-lambda": ["my-lambda-function:production"],
                                "aws-s3": ["my-s3-bucket.with.data"]
                            },
                            "vpc_config": {
                                "subnet_ids": ["subnet-id-1"],
                                "security_group_ids": ["sg-id-1"]
                            }
                        }
                    },
                    "cloudwatch_monitoring": {"enabled": true},
                    "kinesis": {"streams": {"shards": 1, "retention": 24}},
                    "kinesis_events": {"enabled": true},
                    "cloudtrail": {"enable_logging": true, "enable_kinesis": true},
                    "flow_logs": {
                        "enabled": true,
                        "log_group_name": "unit-test-advanced",
                        "vpcs": ["vpc-id-1", "vpc-id-2"]
                    },
                    "s3_events": [
                        {"bucket_id": "unit-test-bucket.data"},
                        {
                            "bucket_id": "unit-test.cloudtrail.data",
                            "enable_events": false,
                            "filter_prefix": "AWSLogs/"
                        }
                    ]
                },
                "outputs": {"kinesis": ["username", "access_key_id", "secret_key"]}
            }
        }
    })
}

pub fn unit_test_config() -> StreamAlertConfig {
    serde_json::from_value(unit_test_document()).expect("unit test config should parse")
}

pub fn unit_test_store() -> MemoryConfigStore {
    MemoryConfigStore::from_value(unit_test_document()).expect("unit test store should build")
}
