use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ChurnError;
use crate::types::{Category, EmptyLineMode, SortMode};

/// File name of the repository-local configuration.
pub const CONFIG_FILE_NAME: &str = ".churn.toml";

/// User-supplied patterns and extensions that force a category.
///
/// Patterns take three forms: a glob matched against the bare file name,
/// a directory prefix when the pattern ends in `/`, or a plain substring of
/// the normalized path when it has no glob metacharacters.
///
/// # Examples
///
/// ```
/// use churn_core::CategoryOverride;
///
/// let o = CategoryOverride {
///     patterns: vec!["generated/".into(), "*.pb.go".into()],
///     extensions: vec!["snap".into()],
/// };
/// assert!(!o.is_empty());
/// assert!(CategoryOverride::default().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryOverride {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl CategoryOverride {
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.extensions.is_empty()
    }
}

/// One layer of configuration as written in a TOML file or given on the
/// command line. Unset fields leave lower layers untouched.
///
/// # Examples
///
/// ```
/// use churn_core::ConfigLayer;
///
/// let layer = ConfigLayer::from_toml(r#"
/// exclude = ["vendor/**"]
/// empty = "include"
///
/// [categories.docs]
/// extensions = ["adoc"]
/// "#).unwrap();
/// assert_eq!(layer.exclude, vec!["vendor/**"]);
/// assert!(layer.categories.contains_key("docs"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigLayer {
    /// Path globs a file must match to be reported.
    #[serde(default)]
    pub include: Vec<String>,
    /// Path globs that drop a file from the report.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Empty-line counting policy.
    pub empty: Option<EmptyLineMode>,
    /// File list ordering.
    pub sort: Option<SortMode>,
    /// Category overrides keyed by category name.
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryOverride>,
}

impl ConfigLayer {
    /// Parse a layer from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or invalid enum values.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read a layer from `path`, returning `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Io`] if the file exists but cannot be read, or
    /// [`ChurnError::Toml`] if it is not valid configuration.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ChurnError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, skipping");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let layer = Self::from_toml(&content).map_err(|source| ChurnError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config layer");
        Ok(Some(layer))
    }
}

/// Fully resolved settings consumed by the parser, classifier and filter.
///
/// Resolution order: CLI flags > repository `.churn.toml` > global config >
/// built-in defaults.
///
/// # Examples
///
/// ```
/// use churn_core::{ChurnConfig, EmptyLineMode, SortMode};
///
/// let config = ChurnConfig::default();
/// assert_eq!(config.empty, EmptyLineMode::Exclude);
/// assert_eq!(config.sort, SortMode::Churn);
/// assert!(config.include.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChurnConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub empty: EmptyLineMode,
    pub sort: SortMode,
    pub categories: BTreeMap<Category, CategoryOverride>,
}

impl ChurnConfig {
    /// Apply `layer` on top of the current settings.
    ///
    /// Non-empty lists replace the current ones; category tables are merged
    /// per category name.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Config`] if a category name is not one of
    /// `generated`, `docs`, `tests`, `source`, `other`.
    pub fn merge(&mut self, layer: ConfigLayer) -> Result<(), ChurnError> {
        if !layer.include.is_empty() {
            self.include = layer.include;
        }
        if !layer.exclude.is_empty() {
            self.exclude = layer.exclude;
        }
        if let Some(empty) = layer.empty {
            self.empty = empty;
        }
        if let Some(sort) = layer.sort {
            self.sort = sort;
        }
        for (name, category_override) in layer.categories {
            let category: Category = name.parse().map_err(ChurnError::Config)?;
            self.categories.insert(category, category_override);
        }
        Ok(())
    }

    /// Resolve settings from the optional global and repository files plus CLI overrides.
    ///
    /// Missing files are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Toml`] for malformed files and
    /// [`ChurnError::Config`] for unknown category names.
    ///
    /// # Examples
    ///
    /// ```
    /// use churn_core::{ChurnConfig, ConfigLayer, SortMode};
    ///
    /// let cli = ConfigLayer { sort: Some(SortMode::Path), ..ConfigLayer::default() };
    /// let config = ChurnConfig::load(None, None, cli).unwrap();
    /// assert_eq!(config.sort, SortMode::Path);
    /// ```
    pub fn load(
        global: Option<&Path>,
        repo: Option<&Path>,
        cli: ConfigLayer,
    ) -> Result<Self, ChurnError> {
        let mut config = Self::default();
        for path in [global, repo].into_iter().flatten() {
            if let Some(layer) = ConfigLayer::from_file(path)? {
                config.merge(layer)?;
            }
        }
        config.merge(cli)?;
        Ok(config)
    }
}
