//! ThreatStream intelligence API client.
//!
//! Each call returns a single page: the objects that match the configured
//! IOC types and sources, plus the token for the next page when the feed
//! has more and the offset is still under the index ceiling.

use serde::Deserialize;
use threat_intel_core::contract::{FeedPage, Ioc};
use threat_intel_core::error::FeedError;
use threat_intel_core::settings::DownloaderSettings;
use tracing::{debug, warn};

use crate::adapters::feed::{FeedTransport, IntelFeed};

#[derive(Debug, Deserialize)]
struct IntelligencePage {
    #[serde(default)]
    objects: Vec<IntelligenceObject>,
    meta: PageMeta,
}

#[derive(Debug, Deserialize)]
struct IntelligenceObject {
    value: Option<String>,
    itype: Option<String>,
    source: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    next: Option<String>,
    #[serde(default)]
    offset: u64,
}

pub struct ThreatStream<T> {
    transport: T,
    settings: DownloaderSettings,
}

impl<T: FeedTransport> ThreatStream<T> {
    pub fn new(transport: T, settings: DownloaderSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn request_page(&self, path: &str) -> Result<FeedPage, FeedError> {
        let url = format!("{}{}", self.settings.api_url, path);
        let mut attempts = 0;
        loop {
            attempts += 1;
            let last_error = match self.transport.get(&url) {
                Ok(response) if response.status == 200 => return self.parse_page(&response.body),
                Ok(response) if response.status == 500 => "server returned 500".to_string(),
                Ok(response) => {
                    warn!(status = response.status, "threat stream refused the request");
                    return Ok(FeedPage::default());
                }
                Err(error) if error.is_retriable() => error.to_string(),
                Err(error) => return Err(FeedError::Transport(error.to_string())),
            };

            if attempts >= self.settings.max_retry {
                return Err(FeedError::RetriesExhausted {
                    attempts,
                    last_error,
                });
            }
            warn!(attempt = attempts, error = %last_error, "retrying threat stream request");
        }
    }

    fn parse_page(&self, body: &[u8]) -> Result<FeedPage, FeedError> {
        let page: IntelligencePage =
            serde_json::from_slice(body).map_err(FeedError::MalformedBody)?;
        debug!(offset = page.meta.offset, objects = page.objects.len(), "received page");

        let intelligence = page
            .objects
            .into_iter()
            .filter_map(|object| self.accept(object))
            .collect();
        let next_url = page
            .meta
            .next
            .filter(|next| !next.is_empty() && page.meta.offset < self.settings.offset_threshold());

        Ok(FeedPage {
            intelligence,
            next_url,
        })
    }

    fn accept(&self, object: IntelligenceObject) -> Option<Ioc> {
        let kind = object.kind?;
        let source = object.source?;
        if !self.settings.ioc_types.contains(&kind) {
            return None;
        }
        let lowered = source.to_lowercase();
        if !self
            .settings
            .ioc_sources
            .iter()
            .any(|wanted| lowered.contains(wanted.as_str()))
        {
            return None;
        }
        Some(Ioc {
            value: object.value?,
            ioc_type: kind,
            sub_type: object.itype.unwrap_or_default(),
            source,
        })
    }
}

impl<T: FeedTransport> IntelFeed for ThreatStream<T> {
    fn connect(&self) -> Result<FeedPage, FeedError> {
        self.request_page(&self.settings.first_page_path())
    }

    fn fetch(&self, next_url: &str) -> Result<FeedPage, FeedError> {
        self.request_page(next_url)
    }
}
