//! Configuration types for Scenery models.
//!
//! This module provides configuration structures that control model policy.
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! external sources such as TOML files.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining model and history settings.
//! - [`ModelConfig`] - Id generation and edge-parent maintenance policy.
//! - [`HistoryConfig`] - Undo history limits.
//!
//! # Example
//!
//! ```
//! # use scenery::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.model().maintain_edge_parent());
//! assert_eq!(config.history().size(), 100);
//! ```

use serde::Deserialize;

/// Top-level configuration combining model and history settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Model policy section.
    #[serde(default)]
    model: ModelConfig,

    /// Undo history section.
    #[serde(default)]
    history: HistoryConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    ///
    /// # Arguments
    ///
    /// * `model` - Id generation and edge-parent policy.
    /// * `history` - Undo history limits.
    pub fn new(model: ModelConfig, history: HistoryConfig) -> Self {
        Self { model, history }
    }

    /// Returns the model configuration.
    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Returns the history configuration.
    pub fn history(&self) -> &HistoryConfig {
        &self.history
    }
}

/// Model policy.
///
/// Controls how ids are generated for inserted cells and whether edges are
/// kept under the nearest common ancestor of their terminals.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Move edges to the nearest common ancestor of their terminals.
    maintain_edge_parent: bool,

    /// Assign ids to inserted cells that have none.
    create_ids: bool,

    /// Prepended to generated ids.
    id_prefix: String,

    /// Appended to generated ids.
    id_postfix: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            maintain_edge_parent: true,
            create_ids: true,
            id_prefix: String::new(),
            id_postfix: String::new(),
        }
    }
}

impl ModelConfig {
    pub fn maintain_edge_parent(&self) -> bool {
        self.maintain_edge_parent
    }

    pub fn create_ids(&self) -> bool {
        self.create_ids
    }

    pub fn id_prefix(&self) -> &str {
        &self.id_prefix
    }

    pub fn id_postfix(&self) -> &str {
        &self.id_postfix
    }

    pub fn with_maintain_edge_parent(mut self, value: bool) -> Self {
        self.maintain_edge_parent = value;
        self
    }

    pub fn with_create_ids(mut self, value: bool) -> Self {
        self.create_ids = value;
        self
    }

    /// Sets the text surrounding generated ids.
    pub fn with_id_affixes(mut self, prefix: impl Into<String>, postfix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self.id_postfix = postfix.into();
        self
    }

    pub(crate) fn set_maintain_edge_parent(&mut self, value: bool) {
        self.maintain_edge_parent = value;
    }

    pub(crate) fn set_create_ids(&mut self, value: bool) {
        self.create_ids = value;
    }
}

/// Undo history limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of edits kept; `0` keeps every edit.
    size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { size: 100 }
    }
}

impl HistoryConfig {
    /// Creates a history configuration keeping at most `size` edits.
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Returns the maximum number of edits kept, `0` meaning unlimited.
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.model().maintain_edge_parent());
        assert!(config.model().create_ids());
        assert_eq!(config.model().id_prefix(), "");
        assert_eq!(config.model().id_postfix(), "");
        assert_eq!(config.history().size(), 100);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [model]
            id_prefix = "c"
            maintain_edge_parent = false
            "#,
        )
        .expect("valid config");

        assert_eq!(config.model().id_prefix(), "c");
        assert!(!config.model().maintain_edge_parent());
        assert!(config.model().create_ids(), "unset keys keep defaults");
        assert_eq!(config.history().size(), 100);
    }

    #[test]
    fn test_deserialize_history() {
        let config: AppConfig = toml::from_str("[history]\nsize = 0\n").expect("valid config");
        assert_eq!(config.history().size(), 0);
    }

    #[test]
    fn test_builders() {
        let config = ModelConfig::default()
            .with_create_ids(false)
            .with_maintain_edge_parent(false)
            .with_id_affixes("n", "_");
        assert!(!config.create_ids());
        assert!(!config.maintain_edge_parent());
        assert_eq!(config.id_prefix(), "n");
        assert_eq!(config.id_postfix(), "_");
    }
}
