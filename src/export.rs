// 📦 Parsed export - what the export parser hands to the importer
//
// The export format itself (WXR) is parsed elsewhere; this crate consumes
// the parser's output. JsonExportSource reads that output when it has been
// saved as JSON.

use crate::authors::SourceAuthor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTerm {
    pub name: String,

    #[serde(default)]
    pub slug: String,

    /// Taxonomy the term belongs to (category, post_tag, ...)
    #[serde(default = "default_taxonomy")]
    pub domain: String,
}

fn default_taxonomy() -> String {
    "category".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMeta {
    pub key: String,

    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportComment {
    pub comment_id: u64,

    #[serde(default)]
    pub comment_author: String,

    #[serde(default)]
    pub comment_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPost {
    pub post_id: u64,

    #[serde(default)]
    pub post_title: String,

    #[serde(default = "default_post_type")]
    pub post_type: String,

    /// Export login of the author (maps through the author mapping)
    #[serde(default)]
    pub post_author: String,

    #[serde(default)]
    pub terms: Vec<ExportTerm>,

    #[serde(default)]
    pub postmeta: Vec<ExportMeta>,

    #[serde(default)]
    pub comments: Vec<ExportComment>,
}

fn default_post_type() -> String {
    "post".to_string()
}

impl ExportPost {
    pub fn new(post_id: u64, post_title: &str, post_author: &str) -> Self {
        ExportPost {
            post_id,
            post_title: post_title.to_string(),
            post_type: default_post_type(),
            post_author: post_author.to_string(),
            terms: Vec::new(),
            postmeta: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn is_attachment(&self) -> bool {
        self.post_type == "attachment"
    }
}

/// Everything one export file contributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedExport {
    #[serde(default)]
    pub authors: Vec<SourceAuthor>,

    #[serde(default)]
    pub posts: Vec<ExportPost>,
}

impl ParsedExport {
    /// Authors, deduplicated by login (first occurrence wins)
    ///
    /// Logins are unique within a job; some exports repeat the author list.
    pub fn unique_authors(&self) -> Vec<SourceAuthor> {
        let mut seen = std::collections::HashSet::new();
        self.authors
            .iter()
            .filter(|a| seen.insert(a.login.clone()))
            .cloned()
            .collect()
    }
}

// ============================================================================
// EXPORT SOURCE
// ============================================================================

/// Turns an export file into records
pub trait ExportSource {
    fn parse(&self, path: &Path) -> Result<ParsedExport>;

    /// File extensions picked up from directory arguments, in import order
    fn extensions(&self) -> &[&str];
}

/// Reads parser output stored as JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExportSource;

impl ExportSource for JsonExportSource {
    fn parse(&self, path: &Path) -> Result<ParsedExport> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read export file {}", path.display()))?;

        let export: ParsedExport = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to deserialize export file {}", path.display()))?;

        Ok(export)
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }
}
