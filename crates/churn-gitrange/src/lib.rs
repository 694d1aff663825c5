//! Revision range resolution and the `git diff` producer.
//!
//! Decides which revisions to compare (explicit, positional, or
//! auto-detected from `origin/HEAD`, `main`, `master`), answers the repository
//! questions that decision needs through git2, and streams the resulting
//! diff out of the `git` CLI.

pub mod producer;
pub mod query;
pub mod resolve;
