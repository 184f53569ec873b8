//! Engine configuration, loaded from TOML
//!
//! ```toml
//! [history]
//! max_entries = 256
//!
//! [search]
//! max_depth = 3
//! max_frontier = 256
//! max_candidates = 1
//! timeout_ms = 5000
//!
//! [logging]
//! profile = "development"
//! ```
//!
//! Every section and key is optional.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Result, StencilError};
use crate::logging_facility::Profile;
use crate::search::SearchConfig;

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StencilConfig {
    pub history: HistoryConfig,
    pub search: SearchSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Oldest entries are dropped beyond this many; unbounded when absent
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSection {
    pub max_depth: usize,
    pub max_frontier: usize,
    pub max_candidates: usize,
    pub timeout_ms: Option<u64>,
}

impl Default for SearchSection {
    fn default() -> Self {
        let defaults = SearchConfig::default();
        Self {
            max_depth: defaults.max_depth,
            max_frontier: defaults.max_frontier,
            max_candidates: defaults.max_candidates,
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl StencilConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// `Config` for malformed TOML, unknown keys, or zero bounds.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StencilConfig = toml::from_str(text).map_err(|e| StencilError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    ///
    /// `Config` if the file cannot be read or fails [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| StencilError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// # Errors
    ///
    /// `Config` naming the first zero bound.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("history.max_entries", self.history.max_entries.unwrap_or(1)),
            ("search.max_depth", self.search.max_depth),
            ("search.max_frontier", self.search.max_frontier),
            ("search.max_candidates", self.search.max_candidates),
        ];
        for (key, value) in checks {
            if value == 0 {
                return Err(StencilError::Config {
                    message: format!("{} must be at least 1", key),
                });
            }
        }
        if self.search.timeout_ms == Some(0) {
            return Err(StencilError::Config {
                message: "search.timeout_ms must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            max_depth: self.search.max_depth,
            max_frontier: self.search.max_frontier,
            max_candidates: self.search.max_candidates,
            timeout: self.search.timeout_ms.map(Duration::from_millis),
        }
    }
}
