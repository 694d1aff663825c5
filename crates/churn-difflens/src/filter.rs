//! Narrowing classified records by path glob and category.
//!
//! A record is kept when it matches at least one include glob (or there are
//! none), matches no exclude glob, and its category is in the allow-list (or
//! the allow-list is empty).

use churn_core::{Category, ChurnConfig, ClassifiedRecord};
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Raw include/exclude globs and category allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub categories: Vec<Category>,
}

impl FilterCriteria {
    /// Criteria from resolved settings plus a CLI category allow-list.
    pub fn from_config(config: &ChurnConfig, categories: Vec<Category>) -> Self {
        Self {
            include: config.include.clone(),
            exclude: config.exclude.clone(),
            categories,
        }
    }
}

/// Compiled form of [`FilterCriteria`].
///
/// # Examples
///
/// ```
/// use churn_core::{Category, ClassifiedRecord, FileRecord};
/// use churn_difflens::filter::{FileFilter, FilterCriteria};
///
/// let filter = FileFilter::new(&FilterCriteria {
///     include: vec!["src/**".into()],
///     exclude: vec!["**/*_gen.rs".into()],
///     categories: vec![],
/// });
///
/// let rec = |p: &str| ClassifiedRecord::new(FileRecord::new(p), Category::Source, Some("Rust"));
/// assert!(filter.keep(&rec("src/a/lib.rs")));
/// assert!(!filter.keep(&rec("src/a/api_gen.rs")));
/// assert!(!filter.keep(&rec("benches/b.rs")));
/// ```
#[derive(Debug, Default)]
pub struct FileFilter {
    /// `None` when no include globs were given.
    include: Option<Vec<Pattern>>,
    exclude: Vec<Pattern>,
    categories: Vec<Category>,
}

impl FileFilter {
    /// Compile `criteria`. Invalid globs are logged and never match.
    pub fn new(criteria: &FilterCriteria) -> Self {
        let include = if criteria.include.is_empty() {
            None
        } else {
            Some(compile(&criteria.include, "include"))
        };
        Self {
            include,
            exclude: compile(&criteria.exclude, "exclude"),
            categories: criteria.categories.clone(),
        }
    }

    /// Whether `record` survives the filter.
    pub fn keep(&self, record: &ClassifiedRecord) -> bool {
        let path = record.path.replace('\\', "/");

        if let Some(include) = &self.include {
            if !include.iter().any(|p| p.matches_with(&path, MATCH_OPTIONS)) {
                tracing::debug!(path = %record.path, "dropped: no include glob matched");
                return false;
            }
        }

        if let Some(p) = self
            .exclude
            .iter()
            .find(|p| p.matches_with(&path, MATCH_OPTIONS))
        {
            tracing::debug!(path = %record.path, pattern = %p, "dropped: exclude glob matched");
            return false;
        }

        if !self.categories.is_empty() && !self.categories.contains(&record.category) {
            tracing::debug!(path = %record.path, category = %record.category, "dropped: category not selected");
            return false;
        }

        true
    }

    /// Keep the records that pass, preserving order.
    pub fn apply(&self, records: Vec<ClassifiedRecord>) -> Vec<ClassifiedRecord> {
        records.into_iter().filter(|r| self.keep(r)).collect()
    }
}

fn compile(patterns: &[String], kind: &str) -> Vec<Pattern> {
    let mut compiled = Vec::with_capacity(patterns.len());
    for raw in patterns {
        match Pattern::new(&raw.replace('\\', "/")) {
            Ok(p) => compiled.push(p),
            Err(e) => tracing::warn!(pattern = %raw, "ignoring invalid {kind} glob: {e}"),
        }
    }
    compiled
}
