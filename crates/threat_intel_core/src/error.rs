use crate::identity::ArnParseError;

/// Failures talking to the intelligence feed.
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("feed request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
    #[error("feed request could not be sent: {0}")]
    Transport(String),
    #[error("feed returned a malformed page")]
    MalformedBody(#[source] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum DownloaderError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("cannot resolve own function identity")]
    Identity(#[from] ArnParseError),
    #[error("cannot encode iocs")]
    Payload(#[source] serde_json::Error),
    #[error("failed to store iocs at '{key}': {message}")]
    Store { key: String, message: String },
    #[error("failed to invoke '{function_name}': {message}")]
    Invoke {
        function_name: String,
        message: String,
    },
}
