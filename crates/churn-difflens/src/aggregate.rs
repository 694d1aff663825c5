use std::collections::BTreeMap;

use churn_core::{Category, CategoryBreakdown, CategoryTotal, ClassifiedRecord, Report, ReportMeta};

/// Fold filtered records into a [`Report`].
///
/// Every record counts once in the grand total and once in its category.
/// Categories that end with zero churn are left out of `by_category`; their
/// records still appear in `by_file` and in the grand `file_count`.
///
/// # Examples
///
/// ```
/// use churn_core::{Category, ClassifiedRecord, EmptyLineMode, FileRecord, ReportMeta};
/// use churn_difflens::aggregate::aggregate;
///
/// let mut rec = FileRecord::new("main.go");
/// rec.added = 3;
/// rec.deleted = 1;
/// rec.finish();
/// let records = vec![ClassifiedRecord::new(rec, Category::Source, Some("Go"))];
///
/// let meta = ReportMeta::new("main", "HEAD", EmptyLineMode::Exclude, vec![]);
/// let report = aggregate(records, meta);
/// assert_eq!(report.total.churn, 4);
/// assert_eq!(report.by_category[&Category::Source].files, vec!["main.go"]);
/// ```
pub fn aggregate(records: Vec<ClassifiedRecord>, meta: ReportMeta) -> Report {
    let mut total = CategoryTotal::default();
    let mut by_category: BTreeMap<Category, CategoryBreakdown> = BTreeMap::new();

    for record in &records {
        total.add(record);
        let entry = by_category.entry(record.category).or_default();
        entry.totals.add(record);
        entry.files.push(record.path.clone());
    }

    by_category.retain(|_, breakdown| breakdown.totals.churn > 0);

    tracing::debug!(
        files = total.file_count,
        churn = total.churn,
        categories = by_category.len(),
        "aggregated report"
    );

    Report {
        meta,
        total,
        by_category,
        by_file: records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::{EmptyLineMode, FileRecord};

    fn rec(path: &str, added: u64, deleted: u64, category: Category) -> ClassifiedRecord {
        let mut r = FileRecord::new(path);
        r.added = added;
        r.deleted = deleted;
        r.finish();
        ClassifiedRecord::new(r, category, None)
    }

    fn meta() -> ReportMeta {
        ReportMeta::new("main", "HEAD", EmptyLineMode::Exclude, Vec::new())
    }

    #[test]
    fn empty_input_gives_zero_report() {
        let report = aggregate(Vec::new(), meta());
        assert_eq!(report.total, CategoryTotal::default());
        assert!(report.by_category.is_empty());
        assert!(report.by_file.is_empty());
    }

    #[test]
    fn category_sums_equal_grand_total() {
        let report = aggregate(
            vec![
                rec("a.go", 10, 2, Category::Source),
                rec("b.go", 1, 1, Category::Source),
                rec("README.md", 5, 0, Category::Docs),
                rec("a_test.go", 0, 7, Category::Tests),
                rec("go.sum", 30, 30, Category::Generated),
            ],
            meta(),
        );
        assert_eq!(report.total.added, 46);
        assert_eq!(report.total.deleted, 40);
        assert_eq!(report.total.churn, 86);
        assert_eq!(report.total.file_count, 5);

        let summed: u64 = report.by_category.values().map(|b| b.totals.churn).sum();
        assert_eq!(summed, report.total.churn);

        let source = &report.by_category[&Category::Source];
        assert_eq!(source.totals.churn, 14);
        assert_eq!(source.totals.file_count, 2);
        assert_eq!(source.files, vec!["a.go", "b.go"]);
    }

    #[test]
    fn zero_churn_categories_are_omitted() {
        let report = aggregate(
            vec![
                rec("code.go", 1, 0, Category::Source),
                rec("image.png", 0, 0, Category::Other),
            ],
            meta(),
        );
        assert!(report.by_category.contains_key(&Category::Source));
        assert!(!report.by_category.contains_key(&Category::Other));
        assert_eq!(report.total.file_count, 2);
        assert_eq!(report.by_file.len(), 2);
    }

    #[test]
    fn zero_churn_file_counts_in_non_empty_category() {
        let report = aggregate(
            vec![
                rec("logo.svg", 0, 0, Category::Other),
                rec("Makefile", 2, 0, Category::Other),
            ],
            meta(),
        );
        let other = &report.by_category[&Category::Other];
        assert_eq!(other.totals.file_count, 2);
        assert_eq!(other.totals.churn, 2);
        assert_eq!(other.files, vec!["logo.svg", "Makefile"]);
    }

    #[test]
    fn by_file_preserves_input_order() {
        let report = aggregate(
            vec![
                rec("z.go", 1, 0, Category::Source),
                rec("a.md", 1, 0, Category::Docs),
            ],
            meta(),
        );
        let paths: Vec<_> = report.by_file.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["z.go", "a.md"]);
    }
}
