use churn_core::{Category, CategoryOverride, ChurnConfig, EmptyLineMode, ReportMeta};
use churn_difflens::analyze;
use churn_difflens::output::{render_text, RenderOptions};

const MIXED: &str = "\
diff --git a/docs/guide.md b/docs/guide.md
index 1111111..2222222 100644
--- a/docs/guide.md
+++ b/docs/guide.md
@@ -4,0 +5,3 @@
+## Install
+
+Run the installer.
diff --git a/src/server.go b/src/server.go
index 3333333..4444444 100644
--- a/src/server.go
+++ b/src/server.go
@@ -10,2 +10 @@ func serve() {
-\tlog.Println(\"start\")
-\treturn nil
+\treturn listen()
diff --git a/src/server_test.go b/src/server_test.go
new file mode 100644
index 0000000..5555555
--- /dev/null
+++ b/src/server_test.go
@@ -0,0 +1,4 @@
+package src
+
+func TestServe(t *testing.T) {
+}
diff --git a/go.sum b/go.sum
index 6666666..7777777 100644
--- a/go.sum
+++ b/go.sum
@@ -1 +1 @@
-example.com/a v1.0.0 h1:old=
+example.com/a v1.1.0 h1:new=
diff --git a/assets/logo.png b/assets/logo.png
index 8888888..9999999 100644
Binary files a/assets/logo.png and b/assets/logo.png differ
diff --git a/vendor/lib/old.go b/vendor/lib/new.go
similarity index 90%
rename from vendor/lib/old.go
rename to vendor/lib/new.go
index aaaaaaa..bbbbbbb 100644
--- a/vendor/lib/old.go
+++ b/vendor/lib/new.go
@@ -1 +1 @@
-package old
+package lib
";

fn meta(config: &ChurnConfig) -> ReportMeta {
    ReportMeta::new("main", "HEAD", config.empty, Vec::new())
}

fn run(config: &ChurnConfig, categories: &[Category]) -> churn_core::Report {
    analyze(MIXED.as_bytes(), config, categories, meta(config)).unwrap()
}

#[test]
fn mixed_diff_default_settings() {
    let report = run(&ChurnConfig::default(), &[]);

    let paths: Vec<_> = report.by_file.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "docs/guide.md",
            "src/server.go",
            "src/server_test.go",
            "go.sum",
            "assets/logo.png",
            "vendor/lib/new.go",
        ]
    );

    let docs = &report.by_category[&Category::Docs].totals;
    assert_eq!((docs.added, docs.deleted), (2, 0));

    let source = &report.by_category[&Category::Source].totals;
    assert_eq!((source.added, source.deleted, source.churn), (1, 2, 3));

    let tests = &report.by_category[&Category::Tests].totals;
    assert_eq!((tests.added, tests.deleted), (3, 0));

    let generated = &report.by_category[&Category::Generated];
    assert_eq!(generated.totals.churn, 4);
    assert_eq!(generated.files, vec!["go.sum", "vendor/lib/new.go"]);

    assert!(!report.by_category.contains_key(&Category::Other));
    assert_eq!(report.total.file_count, 6);
    assert_eq!(report.total.churn, 2 + 3 + 3 + 4);

    let vendored = report.by_file.iter().find(|r| r.path == "vendor/lib/new.go").unwrap();
    assert_eq!(vendored.language.as_deref(), Some("Go"));
}

#[test]
fn including_empty_lines_counts_blank_additions() {
    let config = ChurnConfig {
        empty: EmptyLineMode::Include,
        ..ChurnConfig::default()
    };
    let report = run(&config, &[]);
    assert_eq!(report.by_category[&Category::Docs].totals.added, 3);
    assert_eq!(report.by_category[&Category::Tests].totals.added, 4);
}

#[test]
fn category_selection_and_globs_combine() {
    let config = ChurnConfig {
        include: vec!["src/**".into()],
        ..ChurnConfig::default()
    };
    let report = run(&config, &[Category::Tests]);
    assert_eq!(report.by_file.len(), 1);
    assert_eq!(report.by_file[0].path, "src/server_test.go");
    assert_eq!(report.total.churn, 3);
}

#[test]
fn exclude_removes_files_from_totals() {
    let config = ChurnConfig {
        exclude: vec!["go.sum".into(), "vendor/**".into()],
        ..ChurnConfig::default()
    };
    let report = run(&config, &[]);
    assert!(!report.by_category.contains_key(&Category::Generated));
    assert_eq!(report.total.file_count, 4);
}

#[test]
fn category_overrides_reclassify() {
    let mut config = ChurnConfig::default();
    config.categories.insert(
        Category::Source,
        CategoryOverride {
            patterns: Vec::new(),
            extensions: vec!["png".into()],
        },
    );
    let report = run(&config, &[]);
    let logo = report.by_file.iter().find(|r| r.path == "assets/logo.png").unwrap();
    assert_eq!(logo.category, Category::Source);
    assert_eq!(logo.churn, 0);
}

#[test]
fn text_rendering_of_mixed_diff() {
    let report = run(&ChurnConfig::default(), &[]);
    let text = render_text(&report, &RenderOptions::default());
    assert_eq!(
        text,
        "Documentation: +2 -0 (2) [1 files]\n\
         Tests: +3 -0 (3) [1 files]\n\
         Source: +1 -2 (3) [1 files]\n\
         Generated: +2 -2 (4) [2 files]\n\
         Total: +8 -4 (12) [6 files]\n"
    );
}
