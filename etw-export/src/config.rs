//! Exporter configuration types
//!
//! This module defines the small set of knobs the exporter exposes: which
//! categories get a dedicated keyword bit, and which argument kinds are never
//! rendered. Everything else (what gets traced, when) belongs to the trace
//! system and the tracing controller.

use crate::categories::{
    DEFAULT_FILTERED_CATEGORIES, DISABLED_OTHER_EVENTS_CATEGORY, MAX_FILTERED_CATEGORIES,
    OTHER_EVENTS_CATEGORY,
};
use crate::types::{ArgKind, ExportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for the exporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Categories with a dedicated keyword bit, in bit order (bit 0 first)
    #[serde(default = "default_filtered_categories")]
    pub filtered_categories: Vec<String>,

    /// Argument kinds that are never rendered (the value slot stays empty)
    ///
    /// Rendering convertable values dominates CPU time and routinely exceeds
    /// the consumer's per-field size limit, so they are skipped by default.
    #[serde(default = "default_skipped_arg_kinds")]
    pub skipped_arg_kinds: Vec<ArgKind>,
}

fn default_filtered_categories() -> Vec<String> {
    DEFAULT_FILTERED_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

fn default_skipped_arg_kinds() -> Vec<ArgKind> {
    vec![ArgKind::Convertable]
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filtered_categories: default_filtered_categories(),
            skipped_arg_kinds: default_skipped_arg_kinds(),
        }
    }
}

impl ExportConfig {
    /// Create a new exporter configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: replace the filtered category list
    pub fn with_filtered_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filtered_categories = names.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method: replace the skipped argument kinds
    pub fn with_skipped_arg_kinds(mut self, kinds: Vec<ArgKind>) -> Self {
        self.skipped_arg_kinds = kinds;
        self
    }

    /// Builder method: render every argument kind
    pub fn render_all_arg_kinds(self) -> Self {
        self.with_skipped_arg_kinds(Vec::new())
    }

    /// Check if an argument kind should be skipped
    pub fn should_skip(&self, kind: ArgKind) -> bool {
        self.skipped_arg_kinds.contains(&kind)
    }

    /// Validate the configuration
    ///
    /// Filtered names must be non-empty, unique, fit below the catch-all bits
    /// and must not shadow the synthetic catch-all names.
    pub fn validate(&self) -> Result<()> {
        if self.filtered_categories.len() > MAX_FILTERED_CATEGORIES {
            return Err(ExportError::InvalidConfig(format!(
                "{} filtered categories configured, at most {} fit in the keyword",
                self.filtered_categories.len(),
                MAX_FILTERED_CATEGORIES
            )));
        }

        let mut seen = HashSet::new();
        for name in &self.filtered_categories {
            if name.is_empty() || name.contains(',') {
                return Err(ExportError::InvalidConfig(format!(
                    "Invalid category name: {:?}",
                    name
                )));
            }
            if name == OTHER_EVENTS_CATEGORY || name == DISABLED_OTHER_EVENTS_CATEGORY {
                return Err(ExportError::InvalidConfig(format!(
                    "Category name is reserved: {}",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ExportError::InvalidConfig(format!(
                    "Duplicate category name: {}",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExportConfig::new();
        assert_eq!(config.filtered_categories.len(), 16);
        assert_eq!(config.filtered_categories[0], "benchmark");
        assert_eq!(config.filtered_categories[15], "latency");
        assert!(config.should_skip(ArgKind::Convertable));
        assert!(!config.should_skip(ArgKind::String));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ExportConfig::new()
            .with_filtered_categories(["gpu", "net"])
            .render_all_arg_kinds();

        assert_eq!(config.filtered_categories, vec!["gpu", "net"]);
        assert!(!config.should_skip(ArgKind::Convertable));
    }

    #[test]
    fn test_validation_rejects_bad_names() {
        let duplicate = ExportConfig::new().with_filtered_categories(["gpu", "gpu"]);
        assert!(duplicate.validate().is_err());

        let empty = ExportConfig::new().with_filtered_categories([""]);
        assert!(empty.validate().is_err());

        let reserved = ExportConfig::new().with_filtered_categories([OTHER_EVENTS_CATEGORY]);
        assert!(reserved.validate().is_err());

        let comma = ExportConfig::new().with_filtered_categories(["a,b"]);
        assert!(comma.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_too_many_categories() {
        let names: Vec<String> = (0..=MAX_FILTERED_CATEGORIES).map(|i| format!("cat{}", i)).collect();
        let config = ExportConfig::new().with_filtered_categories(names);
        assert!(matches!(config.validate(), Err(ExportError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: ExportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ExportConfig::default());

        let config: ExportConfig =
            serde_json::from_str(r#"{"skipped_arg_kinds": []}"#).unwrap();
        assert!(config.skipped_arg_kinds.is_empty());
        assert_eq!(config.filtered_categories.len(), 16);
    }
}
