use std::path::PathBuf;

/// Errors that can occur anywhere in the churn pipeline.
///
/// Library crates return this type directly; the binary turns it into a
/// [`miette::Report`] at the boundary and maps it to an exit code with
/// [`ChurnError::is_config_error`].
///
/// # Examples
///
/// ```
/// use churn_core::ChurnError;
///
/// let err = ChurnError::Config("empty must be 'include' or 'exclude'".into());
/// assert!(err.to_string().contains("empty must be"));
/// assert!(err.is_config_error());
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ChurnError {
    /// Filesystem or stream I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(churn::io))]
    Io(#[from] std::io::Error),

    /// Invalid or malformed settings.
    #[error("configuration error: {0}")]
    #[diagnostic(code(churn::config))]
    Config(String),

    /// Git repository or revision query failure.
    #[error("git error: {0}")]
    #[diagnostic(code(churn::git))]
    Git(String),

    /// None of the auto-detection candidates exist.
    #[error("cannot resolve base ref: tried {}", .tried.join(", "))]
    #[diagnostic(
        code(churn::resolve),
        help("pass --base/--head or a rev-range such as main...HEAD, or run inside a git repository")
    )]
    Resolve {
        /// Candidate references that were probed, in order.
        tried: Vec<String>,
    },

    /// The external diff producer failed to start or exited unsuccessfully.
    #[error("git diff failed: {0}")]
    #[diagnostic(code(churn::diff))]
    DiffProducer(String),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(churn::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error in {}: {source}", .path.display())]
    #[diagnostic(code(churn::config))]
    Toml {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: toml::de::Error,
    },
}

impl ChurnError {
    /// Whether this error stems from malformed settings rather than a runtime failure.
    pub fn is_config_error(&self) -> bool {
        matches!(self, ChurnError::Config(_) | ChurnError::Toml { .. })
    }
}
