//! Diff parsing, path classification and churn aggregation.
//!
//! Turns a zero-context unified diff into per-file added/deleted counts,
//! assigns each file a category and language, narrows the set by glob and
//! category, and folds the survivors into a [`churn_core::Report`].

pub mod aggregate;
pub mod classify;
pub mod filter;
pub mod output;
pub mod parser;

use std::io::BufRead;

use churn_core::{Category, ChurnConfig, ChurnError, Report, ReportMeta};

use crate::classify::Classifier;
use crate::filter::{FileFilter, FilterCriteria};

/// Run the full pipeline over a diff stream: parse, classify, filter, aggregate.
///
/// `categories` restricts the report to the given categories; an empty list
/// keeps all of them.
///
/// # Errors
///
/// Returns [`ChurnError::Io`] if reading `reader` fails.
///
/// # Examples
///
/// ```
/// use churn_core::{Category, ChurnConfig, ReportMeta};
/// use churn_difflens::analyze;
///
/// let diff = "\
/// diff --git a/src/main.rs b/src/main.rs
/// --- a/src/main.rs
/// +++ b/src/main.rs
/// @@ -1 +1,2 @@
/// +fn helper() {}
/// diff --git a/README.md b/README.md
/// --- a/README.md
/// +++ b/README.md
/// @@ -3 +3 @@
/// -old
/// +new
/// ";
/// let config = ChurnConfig::default();
/// let meta = ReportMeta::new("main", "HEAD", config.empty, vec![]);
/// let report = analyze(diff.as_bytes(), &config, &[], meta).unwrap();
/// assert_eq!(report.total.churn, 3);
/// assert_eq!(report.by_category[&Category::Docs].totals.churn, 2);
/// ```
pub fn analyze<R: BufRead>(
    reader: R,
    config: &ChurnConfig,
    categories: &[Category],
    meta: ReportMeta,
) -> Result<Report, ChurnError> {
    let records = parser::parse_diff(reader, config.empty)?;
    let classified = Classifier::from_config(config).classify_all(records);
    let filter = FileFilter::new(&FilterCriteria::from_config(config, categories.to_vec()));
    let kept = filter.apply(classified);
    Ok(aggregate::aggregate(kept, meta))
}
