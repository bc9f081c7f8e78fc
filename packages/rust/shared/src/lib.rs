//! Shared types, error model, and configuration for pdfsorter.
//!
//! This crate is the foundation depended on by all other pdfsorter crates.
//! It provides:
//! - [`PdfSorterError`], the unified error type
//! - Domain constants and option enums ([`UnifyStrategy`], [`ParserKind`], [`ExtractionErrorPolicy`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ExtractConfig, GroupingConfig, ModelConfig, ServerConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{PdfSorterError, Result};
pub use types::{
    DEFAULT_OUTPUT_ARCHIVE, ExtractionErrorPolicy, NO_CONTENT_LABEL, ParserKind, UNKNOWN_FOLDER,
    UnifyStrategy,
};
