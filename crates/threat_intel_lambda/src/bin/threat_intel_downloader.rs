use std::time::Duration;

use aws_sdk_lambda::types::InvocationType;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use threat_intel_lambda::adapters::feed::{FeedTransport, HttpResponse, TransportError};
use threat_intel_lambda::adapters::invoke::SelfInvoker;
use threat_intel_lambda::adapters::ioc_store::IocStore;
use threat_intel_lambda::handlers::downloader::{handle_downloader_event, InvocationContext};
use threat_intel_lambda::logging;
use threat_intel_lambda::runtime::contract::{DownloadOutcome, DownloaderEvent};
use threat_intel_lambda::runtime::identity::FunctionIdentity;
use threat_intel_lambda::runtime::settings::DownloaderSettings;
use threat_intel_lambda::threat_stream::ThreatStream;
use tracing::{error, info};

const FEED_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

struct AwsLambdaSelfInvoker {
    lambda_client: aws_sdk_lambda::Client,
}

impl SelfInvoker for AwsLambdaSelfInvoker {
    fn invoke_async(&self, target: &FunctionIdentity, payload: &[u8]) -> Result<(), String> {
        let request_payload = payload.to_vec();
        let client = self.lambda_client.clone();
        let function_name = target.function_name.clone();
        let qualifier = target.qualifier.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .invoke()
                    .function_name(function_name)
                    .set_qualifier(qualifier)
                    .invocation_type(InvocationType::Event)
                    .set_payload(Some(request_payload.into()))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to invoke lambda: {error}"))
            })
        })
    }
}

struct S3IocStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl IocStore for S3IocStore {
    fn write_object(&self, key: &str, body: &[u8]) -> Result<(), String> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .content_type("application/x-ndjson")
                    .body(ByteStream::from(body_bytes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to write object to s3: {error}"))
            })
        })
    }
}

struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl FeedTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let client = self.http_client.clone();
        let url = url.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let response = client.get(url).send().await.map_err(classify)?;
                let status = response.status().as_u16();
                let body = response
                    .bytes()
                    .await
                    .map_err(|error| TransportError::Body(error.without_url().to_string()))?;
                Ok::<_, TransportError>(HttpResponse {
                    status,
                    body: body.to_vec(),
                })
            })
        })
    }
}

// Query strings carry the API key, so URLs are stripped from messages.
fn classify(error: reqwest::Error) -> TransportError {
    let error = error.without_url();
    if error.is_builder() {
        TransportError::Request(error.to_string())
    } else if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(error.to_string())
    }
}

fn remaining_time(deadline_ms: u64, now_ms: i64) -> Duration {
    let now_ms = u64::try_from(now_ms).unwrap_or(0);
    Duration::from_millis(deadline_ms.saturating_sub(now_ms))
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<DownloadOutcome, Error> {
    let settings = DownloaderSettings::from_env().map_err(|error| Error::from(error.to_string()))?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let (payload, context) = event.into_parts();

    let downloader_event = DownloaderEvent::from_payload(payload)
        .map_err(|error| Error::from(format!("invalid downloader event: {error}")))?;
    let now = Utc::now();
    let invocation = InvocationContext {
        invoked_function_arn: context.invoked_function_arn.clone(),
        request_id: context.request_id.clone(),
        remaining_time: remaining_time(context.deadline, now.timestamp_millis()),
        run_date: now.format("%Y-%m-%d").to_string(),
    };

    let http_client = reqwest::Client::builder()
        .timeout(FEED_REQUEST_TIMEOUT)
        .build()
        .map_err(|error| Error::from(format!("failed to build http client: {error}")))?;
    let feed = ThreatStream::new(ReqwestTransport { http_client }, settings.clone());
    let store = S3IocStore {
        bucket: settings.bucket.clone(),
        s3_client: aws_sdk_s3::Client::new(&aws_config),
    };
    let invoker = AwsLambdaSelfInvoker {
        lambda_client: aws_sdk_lambda::Client::new(&aws_config),
    };

    let outcome = handle_downloader_event(
        &downloader_event,
        &invocation,
        &settings,
        &feed,
        &store,
        &invoker,
    )
    .map_err(|error| {
        error!(error = %error, request_id = %invocation.request_id, "download failed");
        Error::from(error)
    })?;
    info!(outcome = ?outcome, request_id = %invocation.request_id, "download finished");
    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let level =
        std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging::DEFAULT_LOG_LEVEL.to_string());
    logging::init(&level).map_err(Error::from)?;
    lambda_runtime::run(service_fn(handle_request)).await
}
