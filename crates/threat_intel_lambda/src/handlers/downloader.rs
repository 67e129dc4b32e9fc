use std::time::Duration;

use threat_intel_core::contract::{
    encode_ioc_lines, Continuation, ContinuationPayload, DownloadOutcome, DownloaderEvent,
};
use threat_intel_core::error::DownloaderError;
use threat_intel_core::identity::{parse_lambda_func_arn, FunctionIdentity};
use threat_intel_core::settings::DownloaderSettings;
use threat_intel_core::storage_keys::ioc_object_key;
use tracing::{debug, error, info, warn};

use crate::adapters::feed::IntelFeed;
use crate::adapters::invoke::SelfInvoker;
use crate::adapters::ioc_store::IocStore;

/// What the handler needs from the hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub invoked_function_arn: String,
    pub request_id: String,
    pub remaining_time: Duration,
    pub run_date: String,
}

/// Downloads one page and hands the rest of the feed to a new invocation.
///
/// Without a token the feed session is started with `connect`; with one the
/// page is fetched directly. A blank token ends the run without touching the
/// feed. The identity used for re-invocation is derived
/// from the invoked ARN only when there is a next page to dispatch.
pub fn handle_downloader_event(
    event: &DownloaderEvent,
    context: &InvocationContext,
    settings: &DownloaderSettings,
    feed: &dyn IntelFeed,
    store: &dyn IocStore,
    invoker: &dyn SelfInvoker,
) -> Result<DownloadOutcome, DownloaderError> {
    let page = match event.continuation() {
        Continuation::Fresh => {
            info!("no continuation token, starting a new feed session");
            feed.connect()?
        }
        Continuation::Blank => {
            warn!("blank continuation token, nothing to resume");
            return Ok(DownloadOutcome::Done { iocs_stored: 0 });
        }
        Continuation::Token(token) => {
            debug!("resuming feed from continuation token");
            feed.fetch(token)?
        }
    };

    let iocs_stored = page.intelligence.len();
    if iocs_stored > 0 {
        let key = ioc_object_key(&settings.prefix, &context.run_date, &context.request_id);
        let body = encode_ioc_lines(&page.intelligence).map_err(DownloaderError::Payload)?;
        store
            .write_object(&key, &body)
            .map_err(|message| DownloaderError::Store {
                key: key.clone(),
                message,
            })?;
        info!(count = iocs_stored, key = %key, "stored iocs");
    }

    let Some(next_url) = page.next_url else {
        info!(iocs_stored, "feed exhausted");
        return Ok(DownloadOutcome::Done { iocs_stored });
    };

    if context.remaining_time <= settings.end_time_buffer {
        warn!(
            remaining_ms = context.remaining_time.as_millis() as u64,
            "not enough time left to dispatch the next page"
        );
        return Ok(DownloadOutcome::OutOfTime { iocs_stored });
    }

    let identity = parse_lambda_func_arn(&context.invoked_function_arn)?;
    invoke_lambda_function(&next_url, &identity, invoker)?;
    Ok(DownloadOutcome::Continuing { iocs_stored })
}

/// Dispatches `{"next_url": token}` to `identity` without waiting for it.
///
/// Every dispatch failure surfaces as [`DownloaderError::Invoke`].
pub fn invoke_lambda_function(
    next_url: &str,
    identity: &FunctionIdentity,
    invoker: &dyn SelfInvoker,
) -> Result<(), DownloaderError> {
    let payload = serde_json::to_vec(&ContinuationPayload {
        next_url: next_url.to_string(),
    })
    .expect("continuation payload should serialize");

    invoker.invoke_async(identity, &payload).map_err(|message| {
        error!(
            function = %identity.function_name,
            error = %message,
            "self invocation failed"
        );
        DownloaderError::Invoke {
            function_name: identity.function_name.clone(),
            message,
        }
    })?;
    info!(function = %identity.function_name, "dispatched next page");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::Value;
    use threat_intel_core::contract::{FeedPage, Ioc};
    use threat_intel_core::error::FeedError;
    use threat_intel_core::identity::ArnParseError;
    use threat_intel_core::settings::Credentials;

    use super::*;

    const FUNCTION_ARN: &str =
        "arn:aws:lambda:us-east-1:123456789012:function:prefix_threat_intel_downloader:development";

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum FeedCall {
        Connect,
        Fetch(String),
    }

    struct CapturingFeed {
        calls: Mutex<Vec<FeedCall>>,
        page: FeedPage,
    }

    impl CapturingFeed {
        fn new(page: FeedPage) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                page,
            }
        }

        fn calls(&self) -> Vec<FeedCall> {
            self.calls.lock().expect("poisoned mutex").clone()
        }
    }

    impl IntelFeed for CapturingFeed {
        fn connect(&self) -> Result<FeedPage, FeedError> {
            self.calls.lock().expect("poisoned mutex").push(FeedCall::Connect);
            Ok(self.page.clone())
        }

        fn fetch(&self, next_url: &str) -> Result<FeedPage, FeedError> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .push(FeedCall::Fetch(next_url.to_string()));
            Ok(self.page.clone())
        }
    }

    #[derive(Default)]
    struct CapturingStore {
        objects: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl CapturingStore {
        fn objects(&self) -> Vec<(String, Vec<u8>)> {
            self.objects.lock().expect("poisoned mutex").clone()
        }
    }

    impl IocStore for CapturingStore {
        fn write_object(&self, key: &str, body: &[u8]) -> Result<(), String> {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .push((key.to_string(), body.to_vec()));
            Ok(())
        }
    }

    struct CapturingInvoker {
        calls: Mutex<Vec<(FunctionIdentity, Vec<u8>)>>,
        failure: Option<String>,
    }

    impl CapturingInvoker {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failure: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failure: Some(message.to_string()),
            }
        }

        fn payloads(&self) -> Vec<Value> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .iter()
                .map(|(_, payload)| {
                    serde_json::from_slice(payload).expect("payload should be json")
                })
                .collect()
        }

        fn targets(&self) -> Vec<FunctionIdentity> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .iter()
                .map(|(target, _)| target.clone())
                .collect()
        }
    }

    impl SelfInvoker for CapturingInvoker {
        fn invoke_async(&self, target: &FunctionIdentity, payload: &[u8]) -> Result<(), String> {
            if let Some(message) = &self.failure {
                return Err(message.clone());
            }
            self.calls
                .lock()
                .expect("poisoned mutex")
                .push((target.clone(), payload.to_vec()));
            Ok(())
        }
    }

    fn settings() -> DownloaderSettings {
        DownloaderSettings::new(
            Credentials {
                api_user: "test_api_user".to_string(),
                api_key: "test_api_key".to_string(),
            },
            "unit-testing.threat-intel",
        )
    }

    fn context(remaining_secs: u64) -> InvocationContext {
        InvocationContext {
            invoked_function_arn: FUNCTION_ARN.to_string(),
            request_id: "req-1".to_string(),
            remaining_time: Duration::from_secs(remaining_secs),
            run_date: "2026-10-18".to_string(),
        }
    }

    fn sample_ioc() -> Ioc {
        Ioc {
            value: "malicious_domain.com".to_string(),
            ioc_type: "domain".to_string(),
            sub_type: "c2_domain".to_string(),
            source: "crowdstrike".to_string(),
        }
    }

    fn identity() -> FunctionIdentity {
        parse_lambda_func_arn(FUNCTION_ARN).expect("arn should parse")
    }

    #[test]
    fn event_without_token_connects_once() {
        let feed = CapturingFeed::new(FeedPage::last(vec![sample_ioc()]));
        let store = CapturingStore::default();
        let invoker = CapturingInvoker::new();

        let outcome = handle_downloader_event(
            &DownloaderEvent::default(),
            &context(60),
            &settings(),
            &feed,
            &store,
            &invoker,
        )
        .expect("handler should succeed");

        assert_eq!(feed.calls(), vec![FeedCall::Connect]);
        assert_eq!(outcome, DownloadOutcome::Done { iocs_stored: 1 });
        assert!(invoker.payloads().is_empty());
    }

    #[test]
    fn blank_token_ends_run_without_feed_calls() {
        let feed = CapturingFeed::new(FeedPage::last(vec![sample_ioc()]));
        let store = CapturingStore::default();
        let invoker = CapturingInvoker::new();

        let outcome = handle_downloader_event(
            &DownloaderEvent::with_token(""),
            &context(60),
            &settings(),
            &feed,
            &store,
            &invoker,
        )
        .expect("handler should succeed");

        assert_eq!(outcome, DownloadOutcome::Done { iocs_stored: 0 });
        assert!(feed.calls().is_empty());
        assert!(store.objects().is_empty());
        assert!(invoker.payloads().is_empty());
    }

    #[test]
    fn event_with_token_fetches_without_connecting() {
        let feed = CapturingFeed::new(FeedPage::default());
        let store = CapturingStore::default();
        let invoker = CapturingInvoker::new();

        handle_downloader_event(
            &DownloaderEvent::with_token("next_token"),
            &context(60),
            &settings(),
            &feed,
            &store,
            &invoker,
        )
        .expect("handler should succeed");

        assert_eq!(feed.calls(), vec![FeedCall::Fetch("next_token".to_string())]);
        assert!(store.objects().is_empty());
    }

    #[test]
    fn next_page_reinvokes_own_function() {
        let feed = CapturingFeed::new(FeedPage {
            intelligence: vec![sample_ioc()],
            next_url: Some("/api/v1/intelligence/?offset=1000".to_string()),
        });
        let store = CapturingStore::default();
        let invoker = CapturingInvoker::new();

        let outcome = handle_downloader_event(
            &DownloaderEvent::with_token("next_token"),
            &context(60),
            &settings(),
            &feed,
            &store,
            &invoker,
        )
        .expect("handler should succeed");

        assert_eq!(outcome, DownloadOutcome::Continuing { iocs_stored: 1 });
        assert_eq!(
            invoker.payloads(),
            vec![serde_json::json!({"next_url": "/api/v1/intelligence/?offset=1000"})]
        );
        assert_eq!(invoker.targets(), vec![identity()]);

        let objects = store.objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects[0].0,
            "threat_intel/iocs/run_date=2026-10-18/request_id=req-1/iocs.jsonl"
        );
    }

    #[test]
    fn low_remaining_time_skips_reinvocation() {
        let feed = CapturingFeed::new(FeedPage {
            intelligence: Vec::new(),
            next_url: Some("/next".to_string()),
        });
        let store = CapturingStore::default();
        let invoker = CapturingInvoker::new();

        let outcome = handle_downloader_event(
            &DownloaderEvent::default(),
            &context(5),
            &settings(),
            &feed,
            &store,
            &invoker,
        )
        .expect("handler should succeed");

        assert_eq!(outcome, DownloadOutcome::OutOfTime { iocs_stored: 0 });
        assert!(invoker.payloads().is_empty());
    }

    #[test]
    fn malformed_arn_fails_with_identity_error() {
        let feed = CapturingFeed::new(FeedPage {
            intelligence: Vec::new(),
            next_url: Some("/next".to_string()),
        });
        let store = CapturingStore::default();
        let invoker = CapturingInvoker::new();
        let mut context = context(60);
        context.invoked_function_arn = "prefix_threat_intel_downloader".to_string();

        let error = handle_downloader_event(
            &DownloaderEvent::default(),
            &context,
            &settings(),
            &feed,
            &store,
            &invoker,
        )
        .expect_err("malformed arn should fail");

        assert!(matches!(
            error,
            DownloaderError::Identity(ArnParseError::SegmentCount { found: 1 })
        ));
        assert!(invoker.payloads().is_empty());
    }

    #[test]
    fn invoke_sends_token_payload() {
        let invoker = CapturingInvoker::new();

        invoke_lambda_function("next_token", &identity(), &invoker).expect("invoke should succeed");

        assert_eq!(
            invoker.payloads(),
            vec![serde_json::json!({"next_url": "next_token"})]
        );
    }

    #[test]
    fn invoke_failure_is_invoke_error() {
        let invoker = CapturingInvoker::failing("ResourceNotFoundException");

        let error = invoke_lambda_function("next_token", &identity(), &invoker)
            .expect_err("invoke should fail");

        assert!(matches!(
            error,
            DownloaderError::Invoke { ref function_name, ref message }
                if function_name == "prefix_threat_intel_downloader"
                    && message == "ResourceNotFoundException"
        ));
    }

    #[test]
    fn invoke_failure_during_handling_propagates() {
        let feed = CapturingFeed::new(FeedPage {
            intelligence: Vec::new(),
            next_url: Some("/next".to_string()),
        });
        let store = CapturingStore::default();
        let invoker = CapturingInvoker::failing("throttled");

        let error = handle_downloader_event(
            &DownloaderEvent::default(),
            &context(60),
            &settings(),
            &feed,
            &store,
            &invoker,
        )
        .expect_err("dispatch failure should fail the handler");

        assert!(matches!(error, DownloaderError::Invoke { .. }));
    }
}
