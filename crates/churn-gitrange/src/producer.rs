//! Streaming `git diff` child process.

use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use churn_core::ChurnError;

/// Arguments for a zero-context, rename-aware diff of `range`.
///
/// Quoting of non-ASCII paths is turned off so they reach the parser
/// verbatim. External diff drivers are disabled and the `a/` / `b/` prefixes
/// are pinned, so `diff.external`, `diff.mnemonicPrefix` and `diff.noprefix`
/// in the user's config cannot change the output format.
///
/// # Examples
///
/// ```
/// use churn_gitrange::producer::diff_args;
///
/// let args = diff_args("main...HEAD", &["src".to_string()]);
/// assert_eq!(
///     args,
///     [
///         "-c", "core.quotepath=off", "diff", "--no-color", "--no-ext-diff",
///         "--src-prefix=a/", "--dst-prefix=b/", "-U0", "-M", "main...HEAD", "--", "src",
///     ]
/// );
/// assert!(!diff_args("main...HEAD", &[]).contains(&"--".to_string()));
/// ```
pub fn diff_args(range: &str, pathspecs: &[String]) -> Vec<String> {
    let mut args: Vec<String> = [
        "-c",
        "core.quotepath=off",
        "diff",
        "--no-color",
        "--no-ext-diff",
        "--src-prefix=a/",
        "--dst-prefix=b/",
        "-U0",
        "-M",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(range.to_string());
    if !pathspecs.is_empty() {
        args.push("--".to_string());
        args.extend(pathspecs.iter().cloned());
    }
    args
}

/// A running `git diff` whose stdout is read incrementally.
///
/// Take the output with [`DiffProcess::take_stdout`], read it to the end,
/// then call [`DiffProcess::wait`] to surface a failed exit.
pub struct DiffProcess {
    child: Child,
    stdout: Option<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
}

impl DiffProcess {
    /// Start `git diff` for `range` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::DiffProducer`] if `git` cannot be started.
    pub fn spawn(dir: &Path, range: &str, pathspecs: &[String]) -> Result<Self, ChurnError> {
        let args = diff_args(range, pathspecs);
        tracing::debug!(dir = %dir.display(), ?args, "spawning git");

        let mut child = Command::new("git")
            .args(&args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ChurnError::DiffProducer(format!("failed to start git: {e}")))?;

        let stdout = child.stdout.take().map(BufReader::new);
        // Drained on a separate thread so a chatty stderr cannot block stdout.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        Ok(Self {
            child,
            stdout,
            stderr,
        })
    }

    /// The diff stream. Available once.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::DiffProducer`] if the stream was already taken.
    pub fn take_stdout(&mut self) -> Result<BufReader<ChildStdout>, ChurnError> {
        self.stdout
            .take()
            .ok_or_else(|| ChurnError::DiffProducer("diff output already consumed".into()))
    }

    /// Wait for git to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::DiffProducer`] carrying git's stderr if it
    /// exited unsuccessfully.
    pub fn wait(mut self) -> Result<(), ChurnError> {
        // Dropping an unread stdout lets git finish instead of blocking on a full pipe.
        drop(self.stdout.take());

        let status = self.child.wait()?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        let detail = stderr.trim();
        if detail.is_empty() {
            Err(ChurnError::DiffProducer(format!("git exited with {status}")))
        } else {
            Err(ChurnError::DiffProducer(detail.to_string()))
        }
    }
}
