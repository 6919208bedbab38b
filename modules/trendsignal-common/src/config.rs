use std::env;
use std::fmt;

use crate::error::ConfigError;

/// Environment variable names, in the order they are reported when missing.
pub const NAVER_CLIENT_ID: &str = "NAVER_CLIENT_ID";
pub const NAVER_CLIENT_SECRET: &str = "NAVER_CLIENT_SECRET";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const NOTION_TOKEN: &str = "NOTION_TOKEN";
pub const NOTION_DATABASE_ID: &str = "NOTION_DATABASE_ID";

pub const REQUIRED_VARS: [&str; 5] = [
    NAVER_CLIENT_ID,
    NAVER_CLIENT_SECRET,
    OPENAI_API_KEY,
    NOTION_TOKEN,
    NOTION_DATABASE_ID,
];

/// Opaque credentials and identifiers supplied by the environment.
/// Contains only secrets; tunables live in [`crate::Settings`].
#[derive(Clone)]
pub struct Credentials {
    pub naver_client_id: String,
    pub naver_client_secret: String,
    pub openai_api_key: String,
    pub notion_token: String,
    pub notion_database_id: String,
}

impl Credentials {
    /// Load from the process environment. Blank values count as missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary lookup. Reports every missing name at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut values: Vec<String> = Vec::with_capacity(REQUIRED_VARS.len());

        for key in REQUIRED_VARS {
            match lookup(key).map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => values.push(v),
                _ => {
                    missing.push(key.to_string());
                    values.push(String::new());
                }
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials(missing));
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        Ok(Self {
            naver_client_id: next(),
            naver_client_secret: next(),
            openai_api_key: next(),
            notion_token: next(),
            notion_database_id: next(),
        })
    }

    pub fn log_redacted(&self) {
        tracing::info!("Credentials loaded:");
        tracing::info!("  {NAVER_CLIENT_ID}: {}", preview(&self.naver_client_id));
        tracing::info!("  {NAVER_CLIENT_SECRET}: {}", preview(&self.naver_client_secret));
        tracing::info!("  {OPENAI_API_KEY}: {}", preview(&self.openai_api_key));
        tracing::info!("  {NOTION_TOKEN}: {}", preview(&self.notion_token));
        tracing::info!("  {NOTION_DATABASE_ID}: {}", preview(&self.notion_database_id));
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("naver_client_id", &preview(&self.naver_client_id))
            .field("naver_client_secret", &preview(&self.naver_client_secret))
            .field("openai_api_key", &preview(&self.openai_api_key))
            .field("notion_token", &preview(&self.notion_token))
            .field("notion_database_id", &preview(&self.notion_database_id))
            .finish()
    }
}

fn preview(val: &str) -> String {
    let prefix: String = val.chars().take(5).collect();
    format!("{prefix}...({} chars)", val.chars().count())
}
