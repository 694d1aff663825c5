use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use churn_core::{
    Category, ChurnConfig, ChurnError, ConfigLayer, EmptyLineMode, OutputFormat, ReportMeta,
    SortMode, CONFIG_FILE_NAME,
};
use churn_difflens::output::{render_json, render_markdown, render_text, RenderOptions};
use churn_gitrange::producer::DiffProcess;
use churn_gitrange::query::GitRepository;
use churn_gitrange::resolve::{resolve_range, RangeRequest};

#[derive(Parser)]
#[command(
    name = "churn",
    version,
    about = "Git-aware line-of-code churn reporting",
    long_about = "Reports added and deleted lines between two revisions, grouped into\n\
                  docs, tests, source, generated and uncategorized files.\n\n\
                  Examples:\n  \
                    churn                                   Auto-detect the base (origin/HEAD, main, master)\n  \
                    churn main...HEAD                       Explicit revision range\n  \
                    churn --base main --head feature/x      Explicit base and head\n  \
                    churn --empty include -l                Count blank lines, list files\n  \
                    churn --format json --exclude 'vendor/**'\n  \
                    churn -- docs/ internal/                Restrict git diff to pathspecs",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    report: ReportArgs,

    /// Configuration file to use instead of the repository's .churn.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Revision range, e.g. main...HEAD or v1.0..v2.0
    #[arg(value_name = "REV_RANGE")]
    range: Option<String>,

    /// Base revision (requires --head)
    #[arg(long, requires = "head")]
    base: Option<String>,

    /// Head revision (requires --base)
    #[arg(long, requires = "base")]
    head: Option<String>,

    /// Count empty and whitespace-only changed lines (include|exclude)
    #[arg(long, value_name = "MODE")]
    empty: Option<EmptyLineMode>,

    /// Show the summary followed by a per-file list
    #[arg(long, short = 'l')]
    list: bool,

    /// Show only the per-file list
    #[arg(long, short = 'L')]
    list_only: bool,

    /// Output format
    #[arg(
        long,
        default_value = "text",
        long_help = "Output format.\n\n\
                       Formats:\n  \
                         text      Category summary, optionally with a file list (default)\n  \
                         json      Machine-readable JSON with snake_case keys\n  \
                         markdown  GitHub-flavored Markdown tables"
    )]
    format: OutputFormat,

    /// Only report paths matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    include: Vec<String>,

    /// Drop paths matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Only report these categories: docs, tests, source, generated, other (repeatable)
    #[arg(long, value_name = "CATEGORY", value_delimiter = ',')]
    category: Vec<Category>,

    /// File list ordering (churn|path)
    #[arg(long)]
    sort: Option<SortMode>,

    /// When to use colors
    #[arg(long, default_value = "auto")]
    color: ColorChoice,

    /// Disable colors (same as --color never)
    #[arg(long)]
    no_color: bool,

    /// Pathspecs handed to git diff
    #[arg(last = true, value_name = "PATHSPEC")]
    pathspecs: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a default .churn.toml configuration file
    #[command(long_about = "Create a default .churn.toml configuration file.\n\n\
        Generates a commented-out template with all available options at the\n\
        repository root. Fails if .churn.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ReportArgs {
    fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
        }
    }

    fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            empty: self.empty,
            sort: self.sort,
            ..ConfigLayer::default()
        }
    }

    fn range_request(&self) -> RangeRequest {
        RangeRequest {
            base: self.base.clone(),
            head: self.head.clone(),
            range: self.range.clone(),
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# churn configuration
# Command-line flags override this file, which overrides
# ~/.config/churn/config.toml.

# Only report paths matching one of these globs.
# include = ["src/**", "docs/**"]

# Drop paths matching any of these globs.
# exclude = ["vendor/**", "**/*.snap"]

# Count blank and whitespace-only changed lines: "include" or "exclude".
# empty = "exclude"

# File list ordering: "churn" or "path".
# sort = "churn"

# Extra rules per category. Patterns are globs on the file name, directory
# prefixes ending in "/", or plain substrings of the path.
# [categories.generated]
# patterns = ["*.pb.go", "gen/"]
#
# [categories.docs]
# extensions = ["adoc"]
#
# [categories.tests]
# patterns = ["e2e/"]
#
# [categories.source]
# extensions = ["tmpl"]
"#;

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("churn").join("config.toml"))
}

fn load_config(root: &Path, explicit: Option<&Path>, cli: ConfigLayer) -> Result<ChurnConfig> {
    let repo_config = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(ChurnError::Config(format!(
                    "config file not found: {}",
                    path.display()
                ))
                .into());
            }
            path.to_path_buf()
        }
        None => root.join(CONFIG_FILE_NAME),
    };
    let global = global_config_path();
    let config = ChurnConfig::load(global.as_deref(), Some(&repo_config), cli)?;
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("CHURN_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn run_report(args: &ReportArgs, config_path: Option<&Path>) -> Result<()> {
    let cwd = std::env::current_dir()
        .into_diagnostic()
        .wrap_err("reading current directory")?;
    let repo = GitRepository::discover(&cwd);
    let root = repo
        .as_ref()
        .ok()
        .and_then(GitRepository::workdir)
        .unwrap_or_else(|| cwd.clone());

    let config = load_config(&root, config_path, args.config_layer())?;

    let repo = repo?;
    let resolved = resolve_range(&args.range_request(), &repo)?;
    tracing::debug!(range = %resolved.range, worktree = resolved.head_is_worktree, "resolved range");

    let mut process = DiffProcess::spawn(&cwd, &resolved.range, &args.pathspecs)?;
    let stdout = process.take_stdout()?;
    let meta = ReportMeta::new(
        resolved.base,
        resolved.head,
        config.empty,
        args.pathspecs.clone(),
    );
    let analyzed = churn_difflens::analyze(stdout, &config, &args.category, meta);
    process.wait()?;
    let report = analyzed?;

    let opts = RenderOptions {
        list: args.list,
        list_only: args.list_only,
        sort: config.sort,
        color: args.use_color(),
    };
    let rendered = match args.format {
        OutputFormat::Text => render_text(&report, &opts),
        OutputFormat::Json => render_json(&report)?,
        OutputFormat::Markdown => render_markdown(&report, &opts),
    };

    std::io::stdout()
        .lock()
        .write_all(rendered.as_bytes())
        .into_diagnostic()
        .wrap_err("writing report")
}

fn run_init() -> Result<()> {
    let cwd = std::env::current_dir()
        .into_diagnostic()
        .wrap_err("reading current directory")?;
    let root = GitRepository::discover(&cwd)
        .ok()
        .and_then(|repo| repo.workdir())
        .unwrap_or(cwd);
    let path = root.join(CONFIG_FILE_NAME);
    if path.exists() {
        miette::bail!("{} already exists", path.display());
    }
    std::fs::write(&path, DEFAULT_CONFIG)
        .into_diagnostic()
        .wrap_err_with(|| format!("writing {}", path.display()))?;
    println!("Created {} with default configuration", path.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => run_report(&cli.report, cli.config.as_deref()),
        Some(Command::Init) => run_init(),
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "churn", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// 2 for invalid configuration, 1 for everything else.
fn exit_code(report: &miette::Report) -> u8 {
    match report.downcast_ref::<ChurnError>() {
        Some(e) if e.is_config_error() => 2,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }));
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(exit_code(&report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_range_and_pathspecs() {
        let cli = Cli::try_parse_from(["churn", "main...HEAD", "-l", "--", "src", "docs"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.report.range.as_deref(), Some("main...HEAD"));
        assert!(cli.report.list);
        assert_eq!(cli.report.pathspecs, vec!["src", "docs"]);
    }

    #[test]
    fn repeatable_filters() {
        let cli = Cli::try_parse_from([
            "churn",
            "--include",
            "src/**",
            "--include",
            "lib/**",
            "--category",
            "tests,docs",
            "--category",
            "source",
        ])
        .unwrap();
        assert_eq!(cli.report.include, vec!["src/**", "lib/**"]);
        assert_eq!(
            cli.report.category,
            vec![Category::Tests, Category::Docs, Category::Source]
        );
    }

    #[test]
    fn invalid_values_are_usage_errors() {
        for args in [
            vec!["churn", "--empty", "sometimes"],
            vec!["churn", "--sort", "size"],
            vec!["churn", "--format", "xml"],
            vec!["churn", "--category", "misc"],
        ] {
            let err = Cli::try_parse_from(args.clone()).err().unwrap();
            assert_eq!(err.exit_code(), 2, "{args:?}");
        }
    }

    #[test]
    fn base_requires_head() {
        assert!(Cli::try_parse_from(["churn", "--base", "main"]).is_err());
        assert!(Cli::try_parse_from(["churn", "--base", "main", "--head", "x"]).is_ok());
    }

    #[test]
    fn at_most_one_positional_range() {
        assert!(Cli::try_parse_from(["churn", "a...b", "c...d"]).is_err());
    }

    #[test]
    fn init_subcommand() {
        let cli = Cli::try_parse_from(["churn", "init"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Init)));
    }

    #[test]
    fn no_color_overrides_always() {
        let cli = Cli::try_parse_from(["churn", "--color", "always", "--no-color"]).unwrap();
        assert!(!cli.report.use_color());
        let cli = Cli::try_parse_from(["churn", "--color", "always"]).unwrap();
        assert!(cli.report.use_color());
    }

    #[test]
    fn cli_layer_carries_flags() {
        let cli = Cli::try_parse_from(["churn", "--empty", "include", "--sort", "path"]).unwrap();
        let layer = cli.report.config_layer();
        assert_eq!(layer.empty, Some(EmptyLineMode::Include));
        assert_eq!(layer.sort, Some(SortMode::Path));
        assert!(layer.categories.is_empty());
    }

    #[test]
    fn template_parses_as_empty_layer() {
        let layer = ConfigLayer::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(layer, ConfigLayer::default());
    }

    #[test]
    fn config_errors_exit_with_two() {
        let report: miette::Report = ChurnError::Config("bad".into()).into();
        assert_eq!(exit_code(&report), 2);
        let report: miette::Report = ChurnError::Git("nope".into()).into();
        assert_eq!(exit_code(&report), 1);
    }
}
