#[derive(thiserror::Error, Debug)]
pub enum ConfigStoreError {
    #[error("cannot encode the configuration")]
    Encode(#[source] serde_json::Error),
    #[error("cannot decode the stored configuration")]
    Decode(#[source] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error("cluster '{0}' is not defined in the configuration")]
    UnknownCluster(String),
    #[error("invalid CloudWatch event pattern for cluster '{cluster}': {reason}")]
    InvalidEventPattern { cluster: String, reason: String },
    #[error("s3_events entry {index} of cluster '{cluster}' has an empty bucket_id")]
    MissingBucketId { cluster: String, index: usize },
    #[error("cannot persist normalized configuration")]
    Store(#[from] ConfigStoreError),
}
