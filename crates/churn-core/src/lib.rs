//! Core types, configuration, and error handling for churn.
//!
//! This crate provides the shared foundation used by the other churn crates:
//! - [`ChurnError`]: unified error type using `thiserror` and `miette`
//! - [`ChurnConfig`]: settings layered from `.churn.toml`, the global config and CLI flags
//! - Shared types: [`Category`], [`FileRecord`], [`ClassifiedRecord`],
//!   [`CategoryTotal`], [`Report`], [`EmptyLineMode`], [`SortMode`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{CategoryOverride, ChurnConfig, ConfigLayer, CONFIG_FILE_NAME};
pub use error::ChurnError;
pub use types::{
    Category, CategoryBreakdown, CategoryTotal, ClassifiedRecord, EmptyLineMode, FileRecord,
    OutputFormat, Report, ReportMeta, SortMode,
};
