use serde::{Deserialize, Serialize};

use crate::model::category::{CategorySet, DEFAULT_CATEGORY};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub categories: CategoryConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Default: see src/templates/config.toml
    #[serde(default)]
    pub labels: CategorySet,
    /// Label for items added without one
    #[serde(default = "default_category")]
    pub default: String,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        CategoryConfig {
            labels: CategorySet::default(),
            default: default_category(),
        }
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// How the 7-day activity window behaves near the start of a month
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityWindow {
    /// Window stays inside the reference month and may be shorter than 7 days
    #[default]
    Month,
    /// Always the 7 calendar days ending at the reference date
    Rolling,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub window: ActivityWindow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Ask before delete and clear
    #[serde(default = "default_true")]
    pub confirm: bool,
    /// Column width for todo text in `tick list`
    #[serde(default = "default_text_width")]
    pub text_width: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            confirm: true,
            text_width: default_text_width(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_text_width() -> usize {
    48
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.categories.default, "Personal");
        assert_eq!(config.categories.labels.len(), 5);
        assert_eq!(config.stats.window, ActivityWindow::Month);
        assert!(config.ui.confirm);
        assert_eq!(config.ui.text_width, 48);
    }

    #[test]
    fn template_parses() {
        let config: Config = toml::from_str(include_str!("../templates/config.toml")).unwrap();
        assert_eq!(config.categories.labels, CategorySet::default());
        assert_eq!(config.categories.default, DEFAULT_CATEGORY);
    }

    #[test]
    fn partial_sections() {
        let config: Config = toml::from_str(
            r#"
[categories]
labels = ["Home", "Work"]

[stats]
window = "rolling"
"#,
        )
        .unwrap();
        let labels: Vec<&str> = config.categories.labels.iter().collect();
        assert_eq!(labels, vec!["Home", "Work"]);
        assert_eq!(config.categories.default, "Personal");
        assert_eq!(config.stats.window, ActivityWindow::Rolling);
    }

    #[test]
    fn hand_edited_labels_are_cleaned() {
        let config: Config = toml::from_str(
            r#"
[categories]
labels = ["", " Work", "Work "]
"#,
        )
        .unwrap();
        let labels: Vec<&str> = config.categories.labels.iter().collect();
        assert_eq!(labels, vec!["Work"]);
    }
}
