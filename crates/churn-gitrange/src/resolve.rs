//! Choosing the revision range to diff.

use churn_core::ChurnError;

use crate::query::RevisionQuery;

/// References probed, in order, when no range is given.
pub const AUTO_BASE_CANDIDATES: [&str; 3] = ["origin/HEAD", "main", "master"];

/// Head label used when comparing against the live working tree.
pub const WORKTREE_LABEL: &str = "WORKTREE";

/// What the user asked to compare.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeRequest {
    pub base: Option<String>,
    pub head: Option<String>,
    /// Positional range expression such as `main...HEAD`.
    pub range: Option<String>,
}

impl RangeRequest {
    fn explicit_pair(&self) -> Option<(&str, &str)> {
        match (self.base.as_deref(), self.head.as_deref()) {
            (Some(base), Some(head)) if !base.is_empty() && !head.is_empty() => Some((base, head)),
            _ => None,
        }
    }

    fn positional(&self) -> Option<&str> {
        self.range.as_deref().filter(|r| !r.is_empty())
    }

    /// No base, head or range was given at all.
    pub fn is_automatic(&self) -> bool {
        let unset = |v: &Option<String>| v.as_deref().map_or(true, str::is_empty);
        unset(&self.base) && unset(&self.head) && unset(&self.range)
    }
}

/// Outcome of range resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    /// Expression passed to `git diff`.
    pub range: String,
    /// Base label for report metadata.
    pub base: String,
    /// Head label for report metadata.
    pub head: String,
    /// The diff runs against the working tree rather than a commit.
    pub head_is_worktree: bool,
}

impl ResolvedRange {
    fn committed(range: String) -> Self {
        let (base, head) = split_range(&range);
        Self {
            range,
            base,
            head,
            head_is_worktree: false,
        }
    }
}

/// Split a range expression into base and head labels.
///
/// Splits on the first `...`, otherwise the first `..`; a bare revision is
/// all base with an empty head.
///
/// # Examples
///
/// ```
/// use churn_gitrange::resolve::split_range;
///
/// assert_eq!(split_range("main...HEAD"), ("main".into(), "HEAD".into()));
/// assert_eq!(split_range("v1..v2"), ("v1".into(), "v2".into()));
/// assert_eq!(split_range("abc123"), ("abc123".into(), String::new()));
/// ```
pub fn split_range(range: &str) -> (String, String) {
    if let Some((base, head)) = range.split_once("...") {
        return (base.to_string(), head.to_string());
    }
    if let Some((base, head)) = range.split_once("..") {
        return (base.to_string(), head.to_string());
    }
    (range.to_string(), String::new())
}

/// Resolve `request` into a diffable range.
///
/// Explicit base and head win, then a positional range, then the first of
/// [`AUTO_BASE_CANDIDATES`] that exists paired with `HEAD`. In fully
/// automatic mode a dirty working tree is compared from the merge base of
/// the detected pair instead, with the head labelled [`WORKTREE_LABEL`].
///
/// # Errors
///
/// Returns [`ChurnError::Resolve`] when auto-detection finds none of the
/// candidates.
pub fn resolve_range<Q: RevisionQuery + ?Sized>(
    request: &RangeRequest,
    query: &Q,
) -> Result<ResolvedRange, ChurnError> {
    if let Some((base, head)) = request.explicit_pair() {
        tracing::debug!(base, head, "using explicit base and head");
        return Ok(ResolvedRange::committed(format!("{base}...{head}")));
    }

    if let Some(range) = request.positional() {
        tracing::debug!(range, "using positional range");
        return Ok(ResolvedRange::committed(range.to_string()));
    }

    let Some(candidate) = AUTO_BASE_CANDIDATES
        .iter()
        .copied()
        .find(|name| query.ref_exists(name))
    else {
        return Err(ChurnError::Resolve {
            tried: AUTO_BASE_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        });
    };
    tracing::debug!(candidate, "auto-detected base");

    let committed = ResolvedRange::committed(format!("{candidate}...HEAD"));
    if !request.is_automatic() {
        return Ok(committed);
    }

    match query.worktree_dirty() {
        Ok(true) => {}
        Ok(false) => return Ok(committed),
        Err(e) => {
            tracing::warn!("could not inspect working tree, keeping {}: {e}", committed.range);
            return Ok(committed);
        }
    }

    match query.merge_base(&committed.base, &committed.head) {
        Ok(merge_base) => {
            tracing::debug!(%merge_base, "working tree is dirty, diffing from merge base");
            Ok(ResolvedRange {
                range: merge_base.clone(),
                base: merge_base,
                head: WORKTREE_LABEL.to_string(),
                head_is_worktree: true,
            })
        }
        Err(e) => {
            tracing::warn!("could not find merge base, keeping {}: {e}", committed.range);
            Ok(committed)
        }
    }
}
