use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event the downloader is invoked with.
///
/// Scheduled runs carry no `next_url`; self re-invocations carry the token
/// returned by the previous page. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloaderEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
}

impl DownloaderEvent {
    pub fn with_token(next_url: impl Into<String>) -> Self {
        Self {
            next_url: Some(next_url.into()),
        }
    }

    /// Accepts a `null` payload as an event without a token.
    pub fn from_payload(payload: Value) -> Result<Self, serde_json::Error> {
        if payload.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(payload)
    }

    pub fn continuation(&self) -> Continuation<'_> {
        match self.next_url.as_deref() {
            None => Continuation::Fresh,
            Some(token) if token.trim().is_empty() => Continuation::Blank,
            Some(token) => Continuation::Token(token),
        }
    }
}

/// Where an invocation starts reading the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation<'a> {
    /// No `next_url` key: a scheduled run that opens a new feed session.
    Fresh,
    /// `next_url` present but blank. There is nothing to resume.
    Blank,
    Token(&'a str),
}

/// Body sent to the next invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContinuationPayload {
    pub next_url: String,
}

/// One indicator of compromise that passed the type and source filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ioc {
    pub value: String,
    #[serde(rename = "type")]
    pub ioc_type: String,
    pub sub_type: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPage {
    pub intelligence: Vec<Ioc>,
    pub next_url: Option<String>,
}

impl FeedPage {
    /// A page after which the feed has nothing more to offer.
    pub fn last(intelligence: Vec<Ioc>) -> Self {
        Self {
            intelligence,
            next_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// The feed returned no further token.
    Done { iocs_stored: usize },
    /// The next page was handed to a new invocation.
    Continuing { iocs_stored: usize },
    /// A token was returned but too little execution time was left to
    /// dispatch it.
    OutOfTime { iocs_stored: usize },
}

impl DownloadOutcome {
    pub fn iocs_stored(&self) -> usize {
        match self {
            Self::Done { iocs_stored }
            | Self::Continuing { iocs_stored }
            | Self::OutOfTime { iocs_stored } => *iocs_stored,
        }
    }
}

/// Encodes IOCs as JSON lines, one object per line.
pub fn encode_ioc_lines(iocs: &[Ioc]) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = Vec::new();
    for ioc in iocs {
        serde_json::to_writer(&mut body, ioc)?;
        body.push(b'\n');
    }
    Ok(body)
}
