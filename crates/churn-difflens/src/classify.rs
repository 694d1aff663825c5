//! Path-based classification into churn categories.
//!
//! Categories are checked in a fixed order and the first match wins:
//! generated, docs, tests, source, then other. Classification never touches
//! the filesystem; it is a pure function of the path and the configured
//! overrides.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use churn_core::{Category, CategoryOverride, ChurnConfig, ClassifiedRecord, FileRecord};

/// Directory names whose contents are vendored or build output.
const GENERATED_DIRS: &[&str] = &["vendor", "node_modules", "dist", "build", "third_party"];

/// Dependency lockfiles, compared case-insensitively.
const LOCK_FILES: &[&str] = &[
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "go.sum",
    "cargo.lock",
    "gemfile.lock",
    "composer.lock",
    "poetry.lock",
    "pipfile.lock",
    "bun.lockb",
    "flake.lock",
];

const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "mdx", "rst", "adoc", "txt"];

const DOC_DIRS: &[&str] = &["docs", "documentation"];

const TEST_DIRS: &[&str] = &["test", "tests", "spec", "specs", "__tests__"];

const SOURCE_LANGUAGES: &[(&str, &str)] = &[
    ("go", "Go"),
    ("rs", "Rust"),
    ("py", "Python"),
    ("pyi", "Python"),
    ("pyw", "Python"),
    ("js", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("ts", "TypeScript"),
    ("mts", "TypeScript"),
    ("cts", "TypeScript"),
    ("jsx", "JSX"),
    ("tsx", "TSX"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    ("c", "C"),
    ("h", "C"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("hxx", "C++"),
    ("hh", "C++"),
    ("cs", "C#"),
    ("php", "PHP"),
    ("rb", "Ruby"),
    ("rake", "Ruby"),
    ("swift", "Swift"),
    ("scala", "Scala"),
    ("sc", "Scala"),
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("zsh", "Shell"),
    ("lua", "Lua"),
    ("pl", "Perl"),
    ("pm", "Perl"),
    ("r", "R"),
    ("dart", "Dart"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("erl", "Erlang"),
    ("hrl", "Erlang"),
    ("hs", "Haskell"),
    ("lhs", "Haskell"),
    ("ml", "OCaml"),
    ("mli", "OCaml"),
    ("clj", "Clojure"),
    ("cljs", "Clojure"),
    ("cljc", "Clojure"),
    ("groovy", "Groovy"),
    ("zig", "Zig"),
    ("nim", "Nim"),
    ("v", "V"),
    ("sql", "SQL"),
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("scss", "CSS"),
    ("sass", "CSS"),
    ("less", "CSS"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
    ("toml", "TOML"),
    ("json", "JSON"),
    ("xml", "XML"),
    ("proto", "Protobuf"),
    ("graphql", "GraphQL"),
    ("gql", "GraphQL"),
    ("tf", "Terraform"),
    ("tfvars", "Terraform"),
];

static LANGUAGE_BY_EXTENSION: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SOURCE_LANGUAGES.iter().copied().collect());

/// Language for a lowercase extension without the leading dot.
///
/// # Examples
///
/// ```
/// use churn_difflens::classify::language_for_extension;
///
/// assert_eq!(language_for_extension("go"), Some("Go"));
/// assert_eq!(language_for_extension("tsx"), Some("TSX"));
/// assert_eq!(language_for_extension("png"), None);
/// ```
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    LANGUAGE_BY_EXTENSION.get(ext).copied()
}

/// Assigns categories and languages to file paths.
///
/// # Examples
///
/// ```
/// use churn_core::Category;
/// use churn_difflens::classify::Classifier;
///
/// let classifier = Classifier::default();
/// assert_eq!(classifier.classify("vendor/lib/x.go"), (Category::Generated, Some("Go")));
/// assert_eq!(classifier.classify("docs/guide.md"), (Category::Docs, None));
/// assert_eq!(classifier.classify("pkg/api_test.go"), (Category::Tests, Some("Go")));
/// assert_eq!(classifier.classify("src/main.rs"), (Category::Source, Some("Rust")));
/// assert_eq!(classifier.classify("Makefile"), (Category::Other, None));
/// ```
#[derive(Debug, Default)]
pub struct Classifier {
    overrides: HashMap<Category, OverrideMatcher>,
}

impl Classifier {
    /// Build a classifier from per-category overrides.
    pub fn new(overrides: &BTreeMap<Category, CategoryOverride>) -> Self {
        let overrides = overrides
            .iter()
            .filter(|(_, o)| !o.is_empty())
            .map(|(category, o)| (*category, OverrideMatcher::compile(o)))
            .collect();
        Self { overrides }
    }

    /// Build a classifier from resolved settings.
    pub fn from_config(config: &ChurnConfig) -> Self {
        Self::new(&config.categories)
    }

    /// Category and language for `path`.
    pub fn classify(&self, path: &str) -> (Category, Option<&'static str>) {
        let normalized = path.replace('\\', "/");
        let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);
        // Text after the last dot, so a bare `.md` still has extension `md`.
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        let language = language_for_extension(&ext);

        if self.is_generated(&normalized, file_name, &ext) {
            return (Category::Generated, language);
        }
        if self.is_docs(&normalized, file_name, &ext) {
            return (Category::Docs, language);
        }
        if self.is_tests(&normalized, file_name, &ext) {
            return (Category::Tests, language);
        }
        if self.is_source(&ext) {
            return (Category::Source, language);
        }
        (Category::Other, language)
    }

    /// Attach a category and language to a parsed record.
    pub fn classify_record(&self, record: FileRecord) -> ClassifiedRecord {
        let (category, language) = self.classify(&record.path);
        ClassifiedRecord::new(record, category, language)
    }

    /// Classify every record, preserving order.
    pub fn classify_all(&self, records: Vec<FileRecord>) -> Vec<ClassifiedRecord> {
        records
            .into_iter()
            .map(|record| self.classify_record(record))
            .collect()
    }

    fn override_matches(&self, category: Category, normalized: &str, file_name: &str, ext: &str) -> bool {
        self.overrides
            .get(&category)
            .is_some_and(|m| m.matches(normalized, file_name, ext))
    }

    fn is_generated(&self, normalized: &str, file_name: &str, ext: &str) -> bool {
        if self.override_matches(Category::Generated, normalized, file_name, ext) {
            return true;
        }
        if under_any_dir(normalized, GENERATED_DIRS) {
            return true;
        }
        LOCK_FILES.contains(&file_name.to_lowercase().as_str())
    }

    fn is_docs(&self, normalized: &str, file_name: &str, ext: &str) -> bool {
        if self.override_matches(Category::Docs, normalized, file_name, ext) {
            return true;
        }
        DOC_EXTENSIONS.contains(&ext) || under_any_dir(normalized, DOC_DIRS)
    }

    fn is_tests(&self, normalized: &str, file_name: &str, ext: &str) -> bool {
        if self.override_matches(Category::Tests, normalized, file_name, ext) {
            return true;
        }
        under_any_dir(normalized, TEST_DIRS) || is_test_file_name(file_name)
    }

    fn is_source(&self, ext: &str) -> bool {
        let user_extension = self
            .overrides
            .get(&Category::Source)
            .is_some_and(|m| m.matches_extension(ext));
        user_extension || language_for_extension(ext).is_some()
    }
}

/// Whether any directory segment of `normalized` is one of `dirs`.
fn under_any_dir(normalized: &str, dirs: &[&str]) -> bool {
    let Some((parents, _)) = normalized.rsplit_once('/') else {
        return false;
    };
    parents.split('/').any(|segment| dirs.contains(&segment))
}

fn is_test_file_name(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();

    if lower.contains(".test.") || lower.contains(".spec.") {
        return true;
    }

    // Go
    if lower.ends_with("_test.go") {
        return true;
    }

    // Python
    if let Some(stem) = lower.strip_suffix(".py") {
        if stem.starts_with("test_") || stem.ends_with("_test") {
            return true;
        }
    }

    // Java and Kotlin naming is case-sensitive.
    if file_name.ends_with("Test.java")
        || file_name.ends_with("Tests.java")
        || file_name.ends_with("Test.kt")
    {
        return true;
    }

    // Ruby
    if let Some(stem) = lower.strip_suffix(".rb") {
        if stem.ends_with("_spec") || stem.starts_with("test_") {
            return true;
        }
    }

    false
}

/// Compiled form of a [`CategoryOverride`].
#[derive(Debug, Default)]
struct OverrideMatcher {
    /// Matched against the bare file name.
    globs: Vec<glob::Pattern>,
    /// Patterns ending in `/`, matched at the root or under any ancestor.
    dir_prefixes: Vec<String>,
    /// Literal patterns, matched anywhere in the normalized path.
    substrings: Vec<String>,
    /// Lowercase, without the leading dot.
    extensions: Vec<String>,
}

impl OverrideMatcher {
    fn compile(o: &CategoryOverride) -> Self {
        let mut matcher = Self::default();
        for raw in &o.patterns {
            let pattern = raw.replace('\\', "/");
            match glob::Pattern::new(&pattern) {
                Ok(p) => matcher.globs.push(p),
                Err(e) => tracing::warn!(pattern = %raw, "ignoring invalid category glob: {e}"),
            }
            if pattern.ends_with('/') {
                matcher.dir_prefixes.push(pattern);
            } else if !pattern.contains(['*', '?', '[']) {
                matcher.substrings.push(pattern);
            }
        }
        matcher.extensions = o
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        matcher
    }

    fn matches(&self, normalized: &str, file_name: &str, ext: &str) -> bool {
        self.globs.iter().any(|g| g.matches(file_name))
            || self.dir_prefixes.iter().any(|dir| {
                normalized.starts_with(dir.as_str())
                    || normalized.contains(&format!("/{dir}"))
            })
            || self.substrings.iter().any(|s| normalized.contains(s.as_str()))
            || self.matches_extension(ext)
    }

    fn matches_extension(&self, ext: &str) -> bool {
        !ext.is_empty() && self.extensions.iter().any(|e| e == ext)
    }
}
