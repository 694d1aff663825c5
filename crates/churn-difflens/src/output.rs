//! Text, JSON and markdown rendering of a [`Report`].

use std::fmt::Write;

use churn_core::{Category, ChurnError, ClassifiedRecord, Report, SortMode};

const RESET: &str = "\x1b[0m";

fn color_code(category: Category) -> &'static str {
    match category {
        Category::Docs => "\x1b[34m",
        Category::Tests => "\x1b[33m",
        Category::Source => "\x1b[32m",
        Category::Generated => "\x1b[35m",
        Category::Other => "\x1b[36m",
    }
}

/// Rendering switches shared by the text and markdown formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append the per-file listing after the summary.
    pub list: bool,
    /// Print only the per-file listing.
    pub list_only: bool,
    /// Listing order.
    pub sort: SortMode,
    /// Wrap category names in ANSI colors. Ignored by markdown.
    pub color: bool,
}

impl RenderOptions {
    fn show_summary(&self) -> bool {
        !self.list_only
    }

    fn show_list(&self) -> bool {
        self.list || self.list_only
    }
}

fn label(category: Category, color: bool) -> String {
    if color {
        format!("{}{}{RESET}", color_code(category), category.display_name())
    } else {
        category.display_name().to_string()
    }
}

/// Records sorted for listing and grouped by category in display order.
fn grouped_files(report: &Report, sort: SortMode) -> Vec<(Category, Vec<&ClassifiedRecord>)> {
    let mut sorted: Vec<&ClassifiedRecord> = report.by_file.iter().collect();
    match sort {
        SortMode::Churn => sorted.sort_by(|a, b| b.churn.cmp(&a.churn).then_with(|| a.path.cmp(&b.path))),
        SortMode::Path => sorted.sort_by(|a, b| a.path.cmp(&b.path)),
    }

    Category::DISPLAY_ORDER
        .iter()
        .map(|&category| {
            let files: Vec<_> = sorted
                .iter()
                .copied()
                .filter(|r| r.category == category)
                .collect();
            (category, files)
        })
        .filter(|(_, files)| !files.is_empty())
        .collect()
}

/// Render the human-readable summary and optional file listing.
///
/// # Examples
///
/// ```
/// use churn_core::{Category, ClassifiedRecord, EmptyLineMode, FileRecord, ReportMeta};
/// use churn_difflens::aggregate::aggregate;
/// use churn_difflens::output::{render_text, RenderOptions};
///
/// let mut rec = FileRecord::new("README.md");
/// rec.added = 2;
/// rec.finish();
/// let report = aggregate(
///     vec![ClassifiedRecord::new(rec, Category::Docs, None)],
///     ReportMeta::new("main", "HEAD", EmptyLineMode::Exclude, vec![]),
/// );
///
/// let text = render_text(&report, &RenderOptions::default());
/// assert_eq!(text, "Documentation: +2 -0 (2) [1 files]\nTotal: +2 -0 (2) [1 files]\n");
/// ```
pub fn render_text(report: &Report, opts: &RenderOptions) -> String {
    let mut out = String::new();

    if opts.show_summary() {
        for category in Category::DISPLAY_ORDER {
            let Some(breakdown) = report.by_category.get(&category) else {
                continue;
            };
            let t = &breakdown.totals;
            let _ = writeln!(
                out,
                "{}: +{} -{} ({}) [{} files]",
                label(category, opts.color),
                t.added,
                t.deleted,
                t.churn,
                t.file_count
            );
        }
        let t = &report.total;
        let _ = writeln!(
            out,
            "Total: +{} -{} ({}) [{} files]",
            t.added, t.deleted, t.churn, t.file_count
        );
    }

    if opts.show_list() {
        for (i, (category, files)) in grouped_files(report, opts.sort).into_iter().enumerate() {
            if i > 0 || opts.show_summary() {
                out.push('\n');
            }
            let _ = writeln!(out, "[{}]", label(category, opts.color));
            for r in files {
                let _ = writeln!(out, "+{} -{} {}", r.added, r.deleted, r.path);
            }
        }
    }

    out
}

/// Render the report as pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`ChurnError::Serialization`] if serialization fails.
///
/// # Examples
///
/// ```
/// use churn_core::{EmptyLineMode, ReportMeta};
/// use churn_difflens::aggregate::aggregate;
/// use churn_difflens::output::render_json;
///
/// let report = aggregate(vec![], ReportMeta::new("main", "HEAD", EmptyLineMode::Include, vec![]));
/// let json = render_json(&report).unwrap();
/// assert!(json.contains("\"by_category\": {}"));
/// assert!(json.contains("\"pathspecs\": []"));
/// ```
pub fn render_json(report: &Report) -> Result<String, ChurnError> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

/// Render the report as GitHub-flavored markdown tables.
///
/// # Examples
///
/// ```
/// use churn_core::{EmptyLineMode, ReportMeta};
/// use churn_difflens::aggregate::aggregate;
/// use churn_difflens::output::{render_markdown, RenderOptions};
///
/// let report = aggregate(vec![], ReportMeta::new("main", "HEAD", EmptyLineMode::Exclude, vec![]));
/// let md = render_markdown(&report, &RenderOptions::default());
/// assert!(md.starts_with("# Churn: main...HEAD"));
/// assert!(md.contains("| **Total** | +0 | -0 | 0 | 0 |"));
/// ```
pub fn render_markdown(report: &Report, opts: &RenderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Churn: {}...{}\n", report.meta.base, report.meta.head);

    if opts.show_summary() {
        out.push_str("| Category | Added | Deleted | Churn | Files |\n");
        out.push_str("|----------|------:|--------:|------:|------:|\n");
        for category in Category::DISPLAY_ORDER {
            let Some(breakdown) = report.by_category.get(&category) else {
                continue;
            };
            let t = &breakdown.totals;
            let _ = writeln!(
                out,
                "| {} | +{} | -{} | {} | {} |",
                category.display_name(),
                t.added,
                t.deleted,
                t.churn,
                t.file_count
            );
        }
        let t = &report.total;
        let _ = writeln!(
            out,
            "| **Total** | +{} | -{} | {} | {} |",
            t.added, t.deleted, t.churn, t.file_count
        );
    }

    if opts.show_list() {
        if opts.show_summary() {
            out.push('\n');
        }
        out.push_str("| File | Category | Language | Added | Deleted | Churn |\n");
        out.push_str("|------|----------|----------|------:|--------:|------:|\n");
        for (category, files) in grouped_files(report, opts.sort) {
            for r in files {
                let _ = writeln!(
                    out,
                    "| `{}` | {} | {} | +{} | -{} | {} |",
                    r.path.replace('|', "\\|"),
                    category.display_name(),
                    r.language.as_deref().unwrap_or("-"),
                    r.added,
                    r.deleted,
                    r.churn
                );
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use churn_core::{EmptyLineMode, FileRecord, ReportMeta};

    fn rec(path: &str, added: u64, deleted: u64, category: Category, lang: Option<&str>) -> ClassifiedRecord {
        let mut r = FileRecord::new(path);
        r.added = added;
        r.deleted = deleted;
        r.finish();
        ClassifiedRecord::new(r, category, lang)
    }

    fn sample() -> Report {
        aggregate(
            vec![
                rec("src/b.go", 3, 1, Category::Source, Some("Go")),
                rec("src/a.go", 1, 3, Category::Source, Some("Go")),
                rec("src/z.go", 10, 0, Category::Source, Some("Go")),
                rec("README.md", 2, 0, Category::Docs, None),
                rec("go.sum", 4, 4, Category::Generated, None),
                rec("logo.png", 0, 0, Category::Other, None),
            ],
            ReportMeta::new(
                "main",
                "HEAD",
                EmptyLineMode::Exclude,
                vec!["src".into()],
            ),
        )
    }

    #[test]
    fn summary_follows_display_order_and_skips_empty_categories() {
        let text = render_text(&sample(), &RenderOptions::default());
        assert_eq!(
            text,
            "Documentation: +2 -0 (2) [1 files]\n\
             Source: +14 -4 (18) [3 files]\n\
             Generated: +4 -4 (8) [1 files]\n\
             Total: +20 -8 (28) [6 files]\n"
        );
    }

    #[test]
    fn list_sorted_by_churn_then_path() {
        let opts = RenderOptions {
            list_only: true,
            ..RenderOptions::default()
        };
        let text = render_text(&sample(), &opts);
        assert_eq!(
            text,
            "[Documentation]\n\
             +2 -0 README.md\n\
             \n\
             [Source]\n\
             +10 -0 src/z.go\n\
             +1 -3 src/a.go\n\
             +3 -1 src/b.go\n\
             \n\
             [Generated]\n\
             +4 -4 go.sum\n\
             \n\
             [Uncategorized]\n\
             +0 -0 logo.png\n"
        );
    }

    #[test]
    fn list_sorted_by_path() {
        let opts = RenderOptions {
            list_only: true,
            sort: SortMode::Path,
            ..RenderOptions::default()
        };
        let text = render_text(&sample(), &opts);
        let a = text.find("src/a.go").unwrap();
        let b = text.find("src/b.go").unwrap();
        let z = text.find("src/z.go").unwrap();
        assert!(a < b && b < z);
    }

    #[test]
    fn list_follows_summary_after_blank_line() {
        let opts = RenderOptions {
            list: true,
            ..RenderOptions::default()
        };
        let text = render_text(&sample(), &opts);
        assert!(text.contains("Total: +20 -8 (28) [6 files]\n\n[Documentation]\n"));
    }

    #[test]
    fn colors_wrap_category_names_only() {
        let opts = RenderOptions {
            color: true,
            list: true,
            ..RenderOptions::default()
        };
        let text = render_text(&sample(), &opts);
        assert!(text.contains("\x1b[34mDocumentation\x1b[0m: +2 -0 (2) [1 files]"));
        assert!(text.contains("\x1b[32mSource\x1b[0m"));
        assert!(text.contains("[\x1b[35mGenerated\x1b[0m]"));
        assert!(text.contains("\nTotal: +20"));
    }

    #[test]
    fn empty_report_prints_only_total() {
        let report = aggregate(
            Vec::new(),
            ReportMeta::new("main", "HEAD", EmptyLineMode::Exclude, Vec::new()),
        );
        assert_eq!(
            render_text(&report, &RenderOptions::default()),
            "Total: +0 -0 (0) [0 files]\n"
        );
    }

    #[test]
    fn json_shape() {
        let json = render_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["meta"]["base"], "main");
        assert_eq!(value["meta"]["empty"], "exclude");
        assert_eq!(value["meta"]["pathspecs"][0], "src");
        assert_eq!(value["total"]["churn"], 28);
        assert_eq!(value["total"]["file_count"], 6);
        assert_eq!(value["by_category"]["source"]["churn"], 18);
        assert_eq!(value["by_category"]["source"]["files"][0], "src/b.go");
        assert!(value["by_category"].get("other").is_none());
        assert_eq!(value["by_file"][0]["language"], "Go");
        assert!(value["by_file"][3].get("language").is_none());
        assert_eq!(value["by_file"][5]["category"], "other");
    }

    #[test]
    fn markdown_tables() {
        let opts = RenderOptions {
            list: true,
            ..RenderOptions::default()
        };
        let md = render_markdown(&sample(), &opts);
        assert!(md.starts_with("# Churn: main...HEAD\n\n"));
        assert!(md.contains("| Documentation | +2 | -0 | 2 | 1 |"));
        assert!(md.contains("| **Total** | +20 | -8 | 28 | 6 |"));
        assert!(md.contains("| `src/z.go` | Source | Go | +10 | -0 | 10 |"));
        assert!(md.contains("| `logo.png` | Uncategorized | - | +0 | -0 | 0 |"));
        assert!(!md.contains('\x1b'));
    }
}
