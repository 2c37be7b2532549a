// ⚙️ Import Configuration - validated CLI values for one import command
//
// The binary builds this from clap arguments; library callers can also
// deserialize it.

use crate::progress::DEFAULT_CACHE_CLEAR_INTERVAL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable naming the user store when `--database` is omitted
pub const DATABASE_ENV: &str = "WXR_IMPORT_DB";
pub const DEFAULT_DATABASE: &str = "wxr-import.db";

/// Data that can be left out of an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipOption {
    /// Don't download attachments
    Attachment,
    /// Don't generate intermediate image sizes
    ImageResize,
}

impl SkipOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attachment => "attachment",
            Self::ImageResize => "image_resize",
        }
    }

    /// Parse a comma-separated `--skip` value
    ///
    /// Unknown entries are reported and ignored.
    pub fn parse_list(value: &str) -> Vec<SkipOption> {
        let mut options = Vec::new();
        for raw in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match raw {
                "attachment" => options.push(Self::Attachment),
                "image_resize" => options.push(Self::ImageResize),
                other => tracing::warn!(option = other, "ignoring unknown --skip value"),
            }
        }
        options.dedup();
        options
    }
}

impl fmt::Display for SkipOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an import run needs besides the input files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// `create`, `skip`, or a path to a mapping CSV
    pub authors: String,

    #[serde(default)]
    pub skip: Vec<SkipOption>,

    /// SQLite user store
    #[serde(default = "default_database")]
    pub database: PathBuf,

    #[serde(default = "default_cache_clear_interval")]
    pub cache_clear_interval: u64,
}

/// `$WXR_IMPORT_DB`, or `wxr-import.db` in the working directory
pub fn default_database() -> PathBuf {
    std::env::var(DATABASE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE))
}

fn default_cache_clear_interval() -> u64 {
    DEFAULT_CACHE_CLEAR_INTERVAL
}

impl ImportConfig {
    pub fn new(authors: &str) -> Self {
        ImportConfig {
            authors: authors.to_string(),
            skip: Vec::new(),
            database: default_database(),
            cache_clear_interval: DEFAULT_CACHE_CLEAR_INTERVAL,
        }
    }

    pub fn with_skip(mut self, skip: Vec<SkipOption>) -> Self {
        self.skip = skip;
        self
    }

    pub fn skips(&self, option: &SkipOption) -> bool {
        self.skip.contains(option)
    }

    pub fn fetch_attachments(&self) -> bool {
        !self.skips(&SkipOption::Attachment)
    }

    pub fn resize_images(&self) -> bool {
        !self.skips(&SkipOption::ImageResize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skip_list() {
        assert_eq!(
            SkipOption::parse_list("attachment, image_resize"),
            vec![SkipOption::Attachment, SkipOption::ImageResize]
        );
        assert_eq!(SkipOption::parse_list("thumbnails,"), Vec::<SkipOption>::new());
        assert_eq!(SkipOption::parse_list(""), Vec::<SkipOption>::new());
    }

    #[test]
    fn test_skip_flags_drive_plan_switches() {
        let config = ImportConfig::new("skip").with_skip(vec![SkipOption::Attachment]);

        assert!(!config.fetch_attachments());
        assert!(config.resize_images());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ImportConfig =
            serde_json::from_value(serde_json::json!({ "authors": "create" })).unwrap();

        assert_eq!(config.cache_clear_interval, 500);
        assert!(config.skip.is_empty());
    }
}
