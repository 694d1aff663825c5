use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Semantic bucket a changed file falls into.
///
/// Variants are declared in classification priority order, so the derived
/// `Ord` sorts `Generated` first and `Other` last.
///
/// # Examples
///
/// ```
/// use churn_core::Category;
///
/// let c: Category = "tests".parse().unwrap();
/// assert_eq!(c, Category::Tests);
/// assert_eq!(c.to_string(), "tests");
/// assert!(Category::Generated < Category::Docs);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Vendored directories, build output and dependency lockfiles.
    Generated,
    /// Documentation files and directories.
    Docs,
    /// Test directories and test naming conventions.
    Tests,
    /// Recognized source code.
    Source,
    /// Anything else.
    Other,
}

impl Category {
    /// All categories in classification priority order.
    pub const ALL: [Category; 5] = [
        Category::Generated,
        Category::Docs,
        Category::Tests,
        Category::Source,
        Category::Other,
    ];

    /// Order in which reports list categories.
    pub const DISPLAY_ORDER: [Category; 5] = [
        Category::Docs,
        Category::Tests,
        Category::Source,
        Category::Generated,
        Category::Other,
    ];

    /// Lowercase key used in configuration files and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Generated => "generated",
            Category::Docs => "docs",
            Category::Tests => "tests",
            Category::Source => "source",
            Category::Other => "other",
        }
    }

    /// Human-readable heading used by the text and markdown renderers.
    ///
    /// # Examples
    ///
    /// ```
    /// use churn_core::Category;
    ///
    /// assert_eq!(Category::Docs.display_name(), "Documentation");
    /// assert_eq!(Category::Other.display_name(), "Uncategorized");
    /// ```
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Generated => "Generated",
            Category::Docs => "Documentation",
            Category::Tests => "Tests",
            Category::Source => "Source",
            Category::Other => "Uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generated" => Ok(Category::Generated),
            "docs" => Ok(Category::Docs),
            "tests" => Ok(Category::Tests),
            "source" => Ok(Category::Source),
            "other" => Ok(Category::Other),
            other => Err(format!(
                "unknown category: {other} (expected docs, tests, source, generated or other)"
            )),
        }
    }
}

/// Whether whitespace-only changed lines count towards churn.
///
/// # Examples
///
/// ```
/// use churn_core::EmptyLineMode;
///
/// assert_eq!(EmptyLineMode::default(), EmptyLineMode::Exclude);
/// assert!("include".parse::<EmptyLineMode>().is_ok());
/// assert!("sometimes".parse::<EmptyLineMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyLineMode {
    /// Count blank and whitespace-only lines.
    Include,
    /// Drop blank and whitespace-only lines.
    #[default]
    Exclude,
}

impl fmt::Display for EmptyLineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyLineMode::Include => write!(f, "include"),
            EmptyLineMode::Exclude => write!(f, "exclude"),
        }
    }
}

impl FromStr for EmptyLineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "include" => Ok(EmptyLineMode::Include),
            "exclude" => Ok(EmptyLineMode::Exclude),
            other => Err(format!(
                "empty must be 'include' or 'exclude', got {other:?}"
            )),
        }
    }
}

/// Ordering of the per-file listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Highest churn first, ties broken by path.
    #[default]
    Churn,
    /// Lexicographic by path.
    Path,
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMode::Churn => write!(f, "churn"),
            SortMode::Path => write!(f, "path"),
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "churn" => Ok(SortMode::Churn),
            "path" => Ok(SortMode::Path),
            other => Err(format!("sort must be 'churn' or 'path', got {other:?}")),
        }
    }
}

/// Report rendering format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Line counts for one file in a diff.
///
/// # Examples
///
/// ```
/// use churn_core::FileRecord;
///
/// let mut rec = FileRecord::new("src/lib.rs");
/// rec.added = 3;
/// rec.deleted = 1;
/// rec.finish();
/// assert_eq!(rec.churn, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Post-change path (the rename target for renamed files).
    pub path: String,
    /// Counted added lines.
    pub added: u64,
    /// Counted deleted lines.
    pub deleted: u64,
    /// `added + deleted`, fixed by [`FileRecord::finish`].
    pub churn: u64,
}

impl FileRecord {
    /// Start an empty record for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            added: 0,
            deleted: 0,
            churn: 0,
        }
    }

    /// Recompute `churn` from the counters.
    pub fn finish(&mut self) {
        self.churn = self.added + self.deleted;
    }
}

/// A [`FileRecord`] with its category and detected language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub path: String,
    pub added: u64,
    pub deleted: u64,
    pub churn: u64,
    pub category: Category,
    /// Language derived from the file extension, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ClassifiedRecord {
    /// Attach a category and language to a parsed record.
    pub fn new(record: FileRecord, category: Category, language: Option<&str>) -> Self {
        Self {
            path: record.path,
            added: record.added,
            deleted: record.deleted,
            churn: record.churn,
            category,
            language: language.map(str::to_owned),
        }
    }
}

/// Running totals for a category or for the whole report.
///
/// # Examples
///
/// ```
/// use churn_core::{Category, CategoryTotal, ClassifiedRecord, FileRecord};
///
/// let mut rec = FileRecord::new("a.go");
/// rec.added = 2;
/// rec.finish();
/// let rec = ClassifiedRecord::new(rec, Category::Source, Some("Go"));
///
/// let mut total = CategoryTotal::default();
/// total.add(&rec);
/// total.add(&rec);
/// assert_eq!(total.churn, 4);
/// assert_eq!(total.file_count, 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub added: u64,
    pub deleted: u64,
    pub churn: u64,
    pub file_count: usize,
}

impl CategoryTotal {
    /// Fold one record into the totals.
    pub fn add(&mut self, record: &ClassifiedRecord) {
        self.added += record.added;
        self.deleted += record.deleted;
        self.churn += record.churn;
        self.file_count += 1;
    }
}

/// Totals for one category plus the paths that contributed to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    #[serde(flatten)]
    pub totals: CategoryTotal,
    pub files: Vec<String>,
}

/// Where the report came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMeta {
    /// Base label of the compared range.
    pub base: String,
    /// Head label, or `WORKTREE` when comparing against the working tree.
    pub head: String,
    /// Empty-line policy the counts were produced with.
    pub empty: EmptyLineMode,
    /// Pathspecs handed to the diff producer.
    pub pathspecs: Vec<String>,
    /// RFC 3339 UTC timestamp of the run.
    pub timestamp: String,
}

impl ReportMeta {
    /// Build metadata stamped with the current UTC time.
    pub fn new(
        base: impl Into<String>,
        head: impl Into<String>,
        empty: EmptyLineMode,
        pathspecs: Vec<String>,
    ) -> Self {
        Self {
            base: base.into(),
            head: head.into(),
            empty,
            pathspecs,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// The complete churn report for one invocation.
///
/// Field order is the JSON key order: `meta`, `total`, `by_category`, `by_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub total: CategoryTotal,
    /// Only categories with non-zero churn.
    pub by_category: BTreeMap<Category, CategoryBreakdown>,
    /// Every filtered record, in filter-output order.
    pub by_file: Vec<ClassifiedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for cat in Category::ALL {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
        assert_eq!("DOCS".parse::<Category>().unwrap(), Category::Docs);
        assert!("misc".parse::<Category>().is_err());
    }

    #[test]
    fn category_display_order_covers_all() {
        let mut sorted = Category::DISPLAY_ORDER;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
    }

    #[test]
    fn empty_line_mode_rejects_unknown_values() {
        assert_eq!(
            "exclude".parse::<EmptyLineMode>().unwrap(),
            EmptyLineMode::Exclude
        );
        let err = "Include ".parse::<EmptyLineMode>().unwrap_err();
        assert!(err.contains("include"));
    }

    #[test]
    fn sort_mode_from_str() {
        assert_eq!("path".parse::<SortMode>().unwrap(), SortMode::Path);
        assert_eq!(SortMode::default(), SortMode::Churn);
        assert!("size".parse::<SortMode>().is_err());
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Generated).unwrap();
        assert_eq!(json, "\"generated\"");
    }

    #[test]
    fn breakdown_flattens_totals() {
        let breakdown = CategoryBreakdown {
            totals: CategoryTotal {
                added: 1,
                deleted: 2,
                churn: 3,
                file_count: 1,
            },
            files: vec!["a.md".into()],
        };
        let value = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(value["churn"], 3);
        assert_eq!(value["file_count"], 1);
        assert_eq!(value["files"][0], "a.md");
    }

    #[test]
    fn classified_record_omits_unknown_language() {
        let rec = ClassifiedRecord::new(FileRecord::new("Makefile"), Category::Other, None);
        let value = serde_json::to_value(&rec).unwrap();
        assert!(value.get("language").is_none());
        assert_eq!(value["category"], "other");
    }

    #[test]
    fn report_meta_timestamp_is_utc() {
        let meta = ReportMeta::new("main", "HEAD", EmptyLineMode::Exclude, Vec::new());
        assert!(meta.timestamp.ends_with('Z'));
        assert!(meta.pathspecs.is_empty());
    }
}
