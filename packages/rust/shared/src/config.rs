//! Application configuration for pdfsorter.
//!
//! User config lives at `~/.pdfsorter/pdfsorter.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PdfSorterError, Result};
use crate::types::{DEFAULT_OUTPUT_ARCHIVE, ExtractionErrorPolicy, ParserKind, UnifyStrategy};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pdfsorter.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pdfsorter";

// ---------------------------------------------------------------------------
// Config structs (matching pdfsorter.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input/output defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Completion model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Local model server lifecycle.
    #[serde(default)]
    pub server: ServerConfig,

    /// Text extraction settings.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Label unification settings.
    #[serde(default)]
    pub grouping: GroupingConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Folder scanned for PDFs when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_folder: Option<String>,

    /// Prompt for the folder instead of using `source_folder`.
    #[serde(default)]
    pub interactive: bool,

    /// Name of the archive to produce.
    #[serde(default = "default_output_archive")]
    pub output_archive: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            source_folder: None,
            interactive: false,
            output_archive: default_output_archive(),
        }
    }
}

fn default_output_archive() -> String {
    DEFAULT_OUTPUT_ARCHIVE.into()
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier as known to the completion server.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the Ollama-compatible server.
    #[serde(default = "default_host")]
    pub host: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            host: default_host(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_model() -> String {
    "gemma2:2b".into()
}
fn default_host() -> String {
    "http://localhost:11434".into()
}
fn default_request_timeout() -> u64 {
    120
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Start the model server before processing and stop it afterwards.
    #[serde(default = "default_true")]
    pub manage: bool,

    /// Executable used to start the server.
    #[serde(default = "default_server_command")]
    pub command: String,

    /// Arguments passed to `command`.
    #[serde(default = "default_server_args")]
    pub args: Vec<String>,

    /// How long to wait for the server to answer after spawning it.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            manage: true,
            command: default_server_command(),
            args: default_server_args(),
            startup_timeout_secs: default_startup_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_server_command() -> String {
    "ollama".into()
}
fn default_server_args() -> Vec<String> {
    vec!["serve".into()]
}
fn default_startup_timeout() -> u64 {
    30
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Parser backend.
    #[serde(default)]
    pub parser: ParserKind,

    /// Tika server URL, used when `parser = "tika"`.
    #[serde(default = "default_tika_url")]
    pub tika_url: String,

    /// Number of leading characters of document text sent to the model.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,

    /// Whether a failing file is skipped or aborts the run.
    #[serde(default)]
    pub on_error: ExtractionErrorPolicy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            parser: ParserKind::default(),
            tika_url: default_tika_url(),
            snippet_chars: default_snippet_chars(),
            on_error: ExtractionErrorPolicy::default(),
        }
    }
}

fn default_tika_url() -> String {
    "http://localhost:9998".into()
}
fn default_snippet_chars() -> usize {
    1000
}

/// `[grouping]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Label merge policy.
    #[serde(default)]
    pub strategy: UnifyStrategy,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pdfsorter/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PdfSorterError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pdfsorter/pdfsorter.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PdfSorterError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PdfSorterError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PdfSorterError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PdfSorterError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PdfSorterError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_archive"));
        assert!(toml_str.contains("gemma2:2b"));
        assert!(toml_str.contains("word-intersection"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.output_archive, "organized_pdfs.zip");
        assert_eq!(parsed.extract.snippet_chars, 1000);
        assert_eq!(parsed.server.args, vec!["serve".to_string()]);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
source_folder = "/srv/scans"
interactive = true

[grouping]
strategy = "substring"

[extract]
parser = "tika"
on_error = "abort"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.source_folder.as_deref(), Some("/srv/scans"));
        assert!(config.defaults.interactive);
        assert_eq!(config.defaults.output_archive, DEFAULT_OUTPUT_ARCHIVE);
        assert_eq!(config.grouping.strategy, UnifyStrategy::Substring);
        assert_eq!(config.extract.parser, ParserKind::Tika);
        assert_eq!(config.extract.on_error, ExtractionErrorPolicy::Abort);
        assert_eq!(config.model.host, "http://localhost:11434");
        assert!(config.server.manage);
    }

    #[test]
    fn load_config_from_reports_bad_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pdfsorter.toml");
        std::fs::write(&path, "[model\nname = 3").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, PdfSorterError::Io { .. }));
    }
}
