use thiserror::Error;

/// Fatal pre-flight failures. The only errors that stop a run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("failed to read settings file {path}: {message}")]
    SettingsIo { path: String, message: String },

    #[error("invalid settings file {path}: {message}")]
    SettingsParse { path: String, message: String },

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// A single retrieval failed. Recovered one level up by fallback or placeholder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16, body: String },

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("could not build request for {url}: {message}")]
    InvalidRequest { url: String, message: String },
}

/// A document was fetched but yielded nothing usable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("no selector matched in {source_name}")]
    NoMatches { source_name: String },

    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("invalid JSON from {source_name}: {message}")]
    InvalidJson { source_name: String, message: String },
}

/// Why one trend or context source produced nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// The generative-text call failed. Recovered by a placeholder insight.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("generative-text request failed: {0}")]
    Request(String),

    #[error("generative-text reply was empty")]
    EmptyResponse,
}

/// The record-store write failed. Counted as a per-term failure.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("record store request failed: {0}")]
    Request(String),

    #[error("record store rejected the record (status {status}): {message}")]
    Rejected { status: u16, message: String },
}
