pub mod config;
pub mod error;
pub mod settings;
pub mod types;

pub use config::Credentials;
pub use error::{ConfigError, ExtractionError, FetchError, ParseError, PublishError, SourceError};
pub use settings::Settings;
pub use types::*;
