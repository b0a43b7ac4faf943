//! Barcast Runner: analysis orchestration, configuration, reports, artifacts.
//!
//! This crate builds on `barcast-core` to provide:
//! - TOML configuration with defaults and validation
//! - Year-scoped data loading with provenance and dataset hashing
//! - The analysis orchestrator (`run_analysis`, `run`)
//! - Text and Markdown reports
//! - CSV/JSON artifact export

pub mod analysis;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod report;

pub use analysis::{run, run_analysis, AnalysisError, AnalysisResult, SCHEMA_VERSION};
pub use config::{AnalysisConfig, ConfigError};
pub use data_loader::{compute_dataset_hash, load_year, LoadedYear};
pub use export::{load_artifacts, save_artifacts};
pub use report::{render_markdown, render_text};
