use threat_intel_core::contract::FeedPage;
use threat_intel_core::error::FeedError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("response body was cut short: {0}")]
    Body(String),
    #[error("request could not be built: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether a fresh attempt could succeed.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, Self::Request(_))
    }
}

/// Blocking GET against an absolute URL.
pub trait FeedTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// A paginated intelligence source.
pub trait IntelFeed {
    /// Starts a new session and returns its first page.
    fn connect(&self) -> Result<FeedPage, FeedError>;
    /// Resumes from a token returned by an earlier page.
    fn fetch(&self, next_url: &str) -> Result<FeedPage, FeedError>;
}
