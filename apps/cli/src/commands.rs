//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use indicatif::{ProgressBar, ProgressStyle};
use pdfsorter_core::{OrganizeConfig, OrganizeResult, ProgressReporter, RunConfig, organize_folder};
use pdfsorter_extract::FileLabel;
use pdfsorter_grouping::Groups;
use pdfsorter_shared::{
    AppConfig, ExtractionErrorPolicy, PdfSorterError, UnifyStrategy, init_config, load_config,
    load_config_from,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pdfsorter: group PDF documents by topic into a zip archive.
#[derive(Parser)]
#[command(
    name = "pdfsorter",
    version,
    about = "Group PDF documents by topic with a local language model and archive them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.pdfsorter/pdfsorter.toml.
    #[arg(long, global = true, env = "PDFSORTER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Label merge policy as accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum StrategyArg {
    /// Merge labels sharing a word, keyed by the shared words.
    WordIntersection,
    /// Merge labels where one contains the other.
    Substring,
}

impl From<StrategyArg> for UnifyStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::WordIntersection => UnifyStrategy::WordIntersection,
            StrategyArg::Substring => UnifyStrategy::Substring,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Label, group, and archive the PDFs in a folder.
    Organize(OrganizeArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `organize`. Unset flags fall back to the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct OrganizeArgs {
    /// Folder containing the PDF files.
    pub folder: Option<PathBuf>,

    /// Model identifier passed to the completion server.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Output archive name; the extension is always `.zip`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Prompt for the folder path.
    #[arg(short, long)]
    pub interactive: bool,

    /// Label merge policy.
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Abort on the first file that cannot be labeled.
    #[arg(long)]
    pub fail_fast: bool,

    /// Use an already running model server; never start or stop one.
    #[arg(long)]
    pub no_server: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pdfsorter=info",
        1 => "pdfsorter=debug",
        _ => "pdfsorter=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Organize(args) => cmd_organize(&args, cli.config.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()).await,
        },
    }
}

/// Config file from `--config`, else the default location.
fn resolve_app_config(path: Option<&Path>) -> pdfsorter_shared::Result<AppConfig> {
    match path {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
}

// ---------------------------------------------------------------------------
// organize
// ---------------------------------------------------------------------------

async fn cmd_organize(args: &OrganizeArgs, config_path: Option<&Path>) -> Result<()> {
    let config = resolve_app_config(config_path)?;

    let folder = if args.interactive || config.defaults.interactive {
        prompt_folder(config.defaults.source_folder.as_deref())?
    } else {
        select_folder(args.folder.as_deref(), config.defaults.source_folder.as_deref())?
    };

    let run_config = build_run_config(args, config, folder);

    info!(
        folder = %run_config.organize.source_folder.display(),
        model = %run_config.model.name,
        strategy = %run_config.organize.strategy,
        "organizing PDFs"
    );

    let reporter = CliProgress::new();

    // Dropping the pipeline future on Ctrl-C also drops the model server guard.
    let result = tokio::select! {
        result = organize_folder(&run_config, &reporter) => result,
        _ = tokio::signal::ctrl_c() => {
            reporter.abandon();
            warn!("interrupted, stopping");
            return Err(eyre!("interrupted"));
        }
    };

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            reporter.abandon();
            return Err(e.into());
        }
    };

    print_summary(&result);
    Ok(())
}

/// Positional folder first, then the configured default.
fn select_folder(
    positional: Option<&Path>,
    configured: Option<&str>,
) -> pdfsorter_shared::Result<PathBuf> {
    positional
        .map(Path::to_path_buf)
        .or_else(|| configured.map(PathBuf::from))
        .ok_or_else(|| {
            PdfSorterError::config(
                "no source folder: pass FOLDER, use --interactive, or set defaults.source_folder",
            )
        })
}

/// Ask for the folder on the terminal.
fn prompt_folder(default: Option<&str>) -> pdfsorter_shared::Result<PathBuf> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme)
        .with_prompt("Enter the folder path containing PDF files");
    if let Some(default) = default {
        input = input.default(default.to_string());
    }

    let answer = input
        .interact_text()
        .map_err(|e| PdfSorterError::config(format!("failed to read folder path: {e}")))?;

    let answer = answer.trim();
    if answer.is_empty() {
        return Err(PdfSorterError::config("no source folder entered"));
    }
    Ok(PathBuf::from(answer))
}

/// Merge flags over file config into the pipeline's run config.
fn build_run_config(args: &OrganizeArgs, config: AppConfig, folder: PathBuf) -> RunConfig {
    let AppConfig {
        defaults,
        mut model,
        mut server,
        mut extract,
        grouping,
    } = config;

    if let Some(name) = &args.model {
        model.name = name.clone();
    }
    if args.no_server {
        server.manage = false;
    }
    if args.fail_fast {
        extract.on_error = ExtractionErrorPolicy::Abort;
    }

    let output_archive = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(defaults.output_archive));

    RunConfig {
        organize: OrganizeConfig {
            source_folder: folder,
            output_archive,
            strategy: args.strategy.map(UnifyStrategy::from).unwrap_or(grouping.strategy),
            on_error: extract.on_error,
        },
        model,
        server,
        extract,
    }
}

fn print_summary(result: &OrganizeResult) {
    println!();
    println!(
        "  Zip file '{}' created with the organized structure.",
        result.archive_path.display()
    );
    println!("  Files:   {}", result.file_count);
    println!("  Groups:  {}", result.groups.len());
    if !result.skipped.is_empty() {
        println!("  Skipped: {} (archived unsorted)", result.skipped.len());
    }
    if !result.copy_failures.is_empty() {
        println!("  Not archived: {} (copy failed)", result.copy_failures.len());
    }
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
///
/// Per-file and per-group lines are printed above the spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_labeled(&self, labeled: &FileLabel, current: usize, total: usize) {
        self.spinner.println(format!(
            "File: {} -> Full Context: '{}' | Extracted: '{}'",
            file_name(&labeled.path),
            labeled.raw,
            labeled.label
        ));
        self.spinner
            .set_message(format!("Extracting context [{current}/{total}]"));
    }

    fn file_skipped(&self, path: &Path, error: &PdfSorterError, current: usize, total: usize) {
        self.spinner
            .println(format!("File: {} -> skipped: {error}", file_name(path)));
        self.spinner
            .set_message(format!("Extracting context [{current}/{total}]"));
    }

    fn groups_unified(&self, groups: &Groups) {
        for (label, files) in groups.iter() {
            self.spinner
                .println(format!("Group '{label}' with {} files.", files.len()));
        }
    }

    fn done(&self, _result: &OrganizeResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
