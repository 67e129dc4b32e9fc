use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.threatstream.com";
pub const DEFAULT_PAGE_LIMIT: u64 = 1_000;
pub const DEFAULT_MAX_INDEX: u64 = 1_000_000;
pub const DEFAULT_MAX_RETRY: u32 = 3;
pub const DEFAULT_END_TIME_BUFFER: Duration = Duration::from_secs(5);
pub const DEFAULT_IOC_TYPES: [&str; 3] = ["domain", "ip", "md5"];
pub const DEFAULT_IOC_SOURCES: [&str; 2] = ["crowdstrike", "@airbnb.com"];
pub const DEFAULT_IOC_PREFIX: &str = "threat_intel/iocs";

pub const API_USER_VAR: &str = "THREAT_STREAM_API_USER";
pub const API_KEY_VAR: &str = "THREAT_STREAM_API_KEY";
pub const BUCKET_VAR: &str = "THREAT_INTEL_BUCKET";
pub const PREFIX_VAR: &str = "THREAT_INTEL_PREFIX";
pub const IOC_TYPES_VAR: &str = "THREAT_INTEL_IOC_TYPES";
pub const IOC_SOURCES_VAR: &str = "THREAT_INTEL_IOC_SOURCES";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_user: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_user", &self.api_user)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderSettings {
    pub api_url: String,
    pub credentials: Credentials,
    pub ioc_types: Vec<String>,
    /// Lowercase substrings matched against each object's source.
    pub ioc_sources: Vec<String>,
    pub page_limit: u64,
    pub max_index: u64,
    pub max_retry: u32,
    pub end_time_buffer: Duration,
    pub bucket: String,
    pub prefix: String,
}

impl DownloaderSettings {
    pub fn new(credentials: Credentials, bucket: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            credentials,
            ioc_types: DEFAULT_IOC_TYPES.iter().map(|s| s.to_string()).collect(),
            ioc_sources: DEFAULT_IOC_SOURCES.iter().map(|s| s.to_string()).collect(),
            page_limit: DEFAULT_PAGE_LIMIT,
            max_index: DEFAULT_MAX_INDEX,
            max_retry: DEFAULT_MAX_RETRY,
            end_time_buffer: DEFAULT_END_TIME_BUFFER,
            bucket: bucket.into(),
            prefix: DEFAULT_IOC_PREFIX.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| read(name).ok_or(SettingsError::Missing(name));

        let credentials = Credentials {
            api_user: required(API_USER_VAR)?,
            api_key: required(API_KEY_VAR)?,
        };
        let mut settings = Self::new(credentials, required(BUCKET_VAR)?);

        if let Some(prefix) = read(PREFIX_VAR) {
            settings.prefix = prefix;
        }
        if let Some(types) = read(IOC_TYPES_VAR) {
            settings.ioc_types = split_list(&types);
        }
        if let Some(sources) = read(IOC_SOURCES_VAR) {
            settings.ioc_sources = split_list(&sources.to_lowercase());
        }
        Ok(settings)
    }

    /// Pages starting at or beyond this offset are not followed.
    pub fn offset_threshold(&self) -> u64 {
        self.max_index.saturating_sub(self.page_limit)
    }

    /// Path and query of the first page of active intelligence.
    pub fn first_page_path(&self) -> String {
        format!(
            "/api/v2/intelligence/?username={}&api_key={}&status=active&limit={}",
            self.credentials.api_user, self.credentials.api_key, self.page_limit
        )
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
