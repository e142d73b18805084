use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("feed source error: {0}")]
    Api(String),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("mention fetch failed: {0}")]
    MentionFetch(#[source] SourceError),
    #[error("poller task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("completion request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("completion API returned status {0}")]
    Status(u16),
    #[error("completion response contained no content")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration validation failed:\n{0}")]
    Invalid(String),
}
