#![forbid(unsafe_code)]

//! Palette configuration.
//!
//! Defaults work out of the box. Hosts can override them with environment
//! variables:
//!
//! | variable | field | accepted |
//! |----------|-------|----------|
//! | `SPOTLIGHT_QUEUE_CAPACITY` | `queue_capacity` | positive integer |
//! | `SPOTLIGHT_SCROLL_RETRIES` | `scroll_retry_budget` | integer |
//! | `SPOTLIGHT_SCROLL_PADDING` | `scroll_padding` | integer |
//! | `SPOTLIGHT_PAGE_SIZE` | `page_size` | positive integer |
//! | `SPOTLIGHT_RESULT_LIMIT` | `result_limit` | integer, or `none`/`0` for no limit |
//!
//! Invalid values keep the default and are reported in
//! [`SpotlightConfigParse::errors`].

use std::fmt;

pub const ENV_QUEUE_CAPACITY: &str = "SPOTLIGHT_QUEUE_CAPACITY";
pub const ENV_SCROLL_RETRIES: &str = "SPOTLIGHT_SCROLL_RETRIES";
pub const ENV_SCROLL_PADDING: &str = "SPOTLIGHT_SCROLL_PADDING";
pub const ENV_PAGE_SIZE: &str = "SPOTLIGHT_PAGE_SIZE";
pub const ENV_RESULT_LIMIT: &str = "SPOTLIGHT_RESULT_LIMIT";

/// Tunables for the palette runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotlightConfig {
    /// Pending operations held before the queue is compacted.
    pub queue_capacity: usize,
    /// Deferred retries while waiting for a row to report layout.
    pub scroll_retry_budget: u32,
    /// Gap kept between the selected row and the viewport edges.
    pub scroll_padding: u32,
    /// Rows moved by page up/down.
    pub page_size: usize,
    /// Cap on matched actions per filter pass.
    pub result_limit: Option<usize>,
}

impl Default for SpotlightConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            scroll_retry_budget: 6,
            scroll_padding: 8,
            page_size: 10,
            result_limit: None,
        }
    }
}

/// Configuration parse result with diagnostics.
#[derive(Debug, Clone)]
pub struct SpotlightConfigParse {
    pub config: SpotlightConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl SpotlightConfig {
    /// Set queue capacity (builder).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set scroll retry budget (builder).
    #[must_use]
    pub fn with_scroll_retry_budget(mut self, retries: u32) -> Self {
        self.scroll_retry_budget = retries;
        self
    }

    /// Set scroll padding (builder).
    #[must_use]
    pub fn with_scroll_padding(mut self, padding: u32) -> Self {
        self.scroll_padding = padding;
        self
    }

    /// Set page size (builder).
    #[must_use]
    pub fn with_page_size(mut self, rows: usize) -> Self {
        self.page_size = rows;
        self
    }

    /// Set result limit (builder).
    #[must_use]
    pub fn with_result_limit(mut self, limit: Option<usize>) -> Self {
        self.result_limit = limit;
        self
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok()).config
    }

    /// Parse config from a custom lookup and return diagnostics.
    pub fn from_env_with<F>(mut get: F) -> SpotlightConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_QUEUE_CAPACITY) {
            match parse_usize(&value) {
                Some(n) if n > 0 => config.queue_capacity = n,
                _ => errors.push(ConfigError::new(
                    "queue_capacity",
                    value,
                    "expected positive integer",
                )),
            }
        }

        if let Some(value) = get(ENV_SCROLL_RETRIES) {
            match value.trim().parse::<u32>() {
                Ok(n) => config.scroll_retry_budget = n,
                Err(_) => errors.push(ConfigError::new(
                    "scroll_retry_budget",
                    value,
                    "expected integer",
                )),
            }
        }

        if let Some(value) = get(ENV_SCROLL_PADDING) {
            match value.trim().parse::<u32>() {
                Ok(n) => config.scroll_padding = n,
                Err(_) => {
                    errors.push(ConfigError::new("scroll_padding", value, "expected integer"))
                }
            }
        }

        if let Some(value) = get(ENV_PAGE_SIZE) {
            match parse_usize(&value) {
                Some(n) if n > 0 => config.page_size = n,
                _ => errors.push(ConfigError::new(
                    "page_size",
                    value,
                    "expected positive integer",
                )),
            }
        }

        if let Some(value) = get(ENV_RESULT_LIMIT) {
            let trimmed = value.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                config.result_limit = None;
            } else {
                match parse_usize(trimmed) {
                    Some(0) => config.result_limit = None,
                    Some(n) => config.result_limit = Some(n),
                    None => errors.push(ConfigError::new(
                        "result_limit",
                        value,
                        "expected integer or none",
                    )),
                }
            }
        }

        if !errors.is_empty() {
            crate::warn!(invalid = errors.len(), "ignoring invalid config values");
        }

        SpotlightConfigParse { config, errors }
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.queue_capacity == 0 {
            errors.push(ConfigError::new("queue_capacity", "0", "must be positive"));
        }
        if self.page_size == 0 {
            errors.push(ConfigError::new("page_size", "0", "must be positive"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse().ok()
}
