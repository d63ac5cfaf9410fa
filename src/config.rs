//! Run configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `SCRAPER_`-prefixed environment variables.

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::extract::fields::KeyFields;
use crate::portal::urls::{DEFAULT_CATALOG_HOST, DEFAULT_EVALUATION_HOST, Endpoints};
use crate::retry::RetryPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "course-scraper.toml";
pub const ENV_PREFIX: &str = "SCRAPER_";

/// Fields collected from course detail pages unless configured otherwise.
pub const DEFAULT_KEY_FIELDS: [&str; 7] = [
    "long title",
    "distribution group",
    "credit hours",
    "prerequisites",
    "corequisites",
    "section max enrollment",
    "section enrolled",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Level applied to this crate's log targets when `RUST_LOG` is unset.
    pub log_level: String,
    /// Term codes scraped by the catalog run.
    #[serde(deserialize_with = "term_codes")]
    pub terms: Vec<String>,
    /// Course page labels to collect, matched case-insensitively.
    pub key_fields: Vec<String>,
    /// Value of the evaluation site's session cookie.
    pub session_id: Option<String>,
    pub catalog_host: String,
    pub evaluation_host: String,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    /// Attempts per unit of work; unset retries until success.
    pub max_attempts: Option<u32>,
    pub timeout_secs: u64,
    /// Prefix output with a UTF-8 byte order mark. Unset uses the run's default.
    pub write_bom: Option<bool>,
    /// Also fetch evaluation metrics for every course in a catalog run.
    pub include_evaluations: bool,
    pub url_column: String,
    pub term_column: String,
    pub crn_column: String,
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            terms: Vec::new(),
            key_fields: DEFAULT_KEY_FIELDS.iter().map(|s| s.to_string()).collect(),
            session_id: None,
            catalog_host: DEFAULT_CATALOG_HOST.to_string(),
            evaluation_host: DEFAULT_EVALUATION_HOST.to_string(),
            delay_min_ms: 1000,
            delay_max_ms: 3000,
            max_attempts: None,
            timeout_secs: 30,
            write_bom: None,
            include_evaluations: false,
            url_column: "URL".to_string(),
            term_column: "Recent Term".to_string(),
            crn_column: "CRN".to_string(),
            output: None,
        }
    }
}

impl Config {
    /// Load configuration from `path` (which must exist) or, when absent,
    /// from [`DEFAULT_CONFIG_FILE`] if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => {
                anyhow::ensure!(p.exists(), "Config file {} does not exist", p.display());
                Toml::file(p)
            }
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };

        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Failed to load config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.max_attempts != Some(0),
            "max_attempts must be at least 1 when set"
        );
        anyhow::ensure!(self.timeout_secs > 0, "timeout_secs must be positive");
        Ok(())
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.catalog_host, &self.evaluation_host)
    }

    pub fn key_fields(&self) -> KeyFields {
        KeyFields::new(&self.key_fields)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
        }
    }

    /// The session cookie value, for runs that read the evaluation site.
    pub fn require_session(&self) -> Result<&str> {
        self.session_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .with_context(|| {
                format!("Evaluation pages require a session cookie; set {ENV_PREFIX}SESSION_ID")
            })
    }
}

/// Term codes are written as integers in most configs; accept both forms.
fn term_codes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TermCode {
        Text(String),
        Number(u64),
    }

    Ok(Vec::<TermCode>::deserialize(deserializer)?
        .into_iter()
        .map(|code| match code {
            TermCode::Text(s) => s.trim().to_string(),
            TermCode::Number(n) => n.to_string(),
        })
        .collect())
}
