//! End-to-end `organize` pipeline: folder → labels → groups → unify → zip.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use pdfsorter_archive::{CopyFailure, build_archive};
use pdfsorter_extract::{
    CompletionClient, ContextExtractor, DocumentParser, FileLabel, OllamaClient, ParserBackend,
};
use pdfsorter_grouping::{Groups, unify};
use pdfsorter_shared::{
    ExtractConfig, ExtractionErrorPolicy, ModelConfig, PdfSorterError, Result, ServerConfig,
    UnifyStrategy,
};

use crate::scan::list_pdfs;
use crate::server::ModelServer;

/// Configuration for the [`organize`] pipeline.
#[derive(Debug, Clone)]
pub struct OrganizeConfig {
    /// Folder whose PDF files are organized.
    pub source_folder: PathBuf,
    /// Requested archive path; the extension is forced to `.zip`.
    pub output_archive: PathBuf,
    /// Label merge policy.
    pub strategy: UnifyStrategy,
    /// What to do when a single file cannot be labeled.
    pub on_error: ExtractionErrorPolicy,
}

/// Everything [`organize_folder`] needs to build its own collaborators.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub organize: OrganizeConfig,
    pub model: ModelConfig,
    pub server: ServerConfig,
    pub extract: ExtractConfig,
}

/// A file that could not be labeled and went to the archive root unsorted.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Result of the `organize` pipeline.
#[derive(Debug)]
pub struct OrganizeResult {
    /// Path of the written zip file.
    pub archive_path: PathBuf,
    /// Unified groups as archived.
    pub groups: Groups,
    /// Per-file labels in processing order.
    pub labels: Vec<FileLabel>,
    /// Files that failed labeling.
    pub skipped: Vec<SkippedFile>,
    /// Files left out of the archive because their copy failed.
    pub copy_failures: Vec<CopyFailure>,
    /// Number of PDF files found in the source folder.
    pub file_count: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a file has been labeled.
    fn file_labeled(&self, labeled: &FileLabel, current: usize, total: usize);
    /// Called when a file could not be labeled and is skipped.
    fn file_skipped(&self, path: &Path, error: &PdfSorterError, current: usize, total: usize);
    /// Called once with the unified groups, before archiving.
    fn groups_unified(&self, groups: &Groups);
    /// Called when the pipeline completes.
    fn done(&self, result: &OrganizeResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_labeled(&self, _labeled: &FileLabel, _current: usize, _total: usize) {}
    fn file_skipped(&self, _path: &Path, _error: &PdfSorterError, _current: usize, _total: usize) {}
    fn groups_unified(&self, _groups: &Groups) {}
    fn done(&self, _result: &OrganizeResult) {}
}

/// List the source folder, build the HTTP collaborators from `config`, bring
/// up the model server if asked to, and run [`organize_files`].
///
/// The folder is checked before the server is touched, so a bad folder fails
/// as a configuration error. A server spawned here is stopped before
/// returning, on success and on error.
#[instrument(skip_all, fields(folder = %config.organize.source_folder.display()))]
pub async fn organize_folder(
    config: &RunConfig,
    progress: &dyn ProgressReporter,
) -> Result<OrganizeResult> {
    progress.phase("Scanning folder");
    let files = list_pdfs(&config.organize.source_folder)?;

    let client = OllamaClient::from_config(&config.model)?;
    let parser = ParserBackend::from_config(&config.extract)?;

    let server = if config.server.manage {
        progress.phase("Starting model server");
        Some(ModelServer::start(&config.server, &client).await?)
    } else {
        debug!("model server management disabled");
        None
    };

    let extractor = ContextExtractor::new(parser, client, config.model.name.as_str())
        .with_snippet_chars(config.extract.snippet_chars);

    let result = organize_files(&config.organize, files, &extractor, progress).await;

    if let Some(server) = server {
        server.shutdown();
    }

    result
}

/// Run the full `organize` pipeline with the given extractor, starting from
/// a listing of the source folder.
pub async fn organize<P, C>(
    config: &OrganizeConfig,
    extractor: &ContextExtractor<P, C>,
    progress: &dyn ProgressReporter,
) -> Result<OrganizeResult>
where
    P: DocumentParser,
    C: CompletionClient,
{
    progress.phase("Scanning folder");
    let files = list_pdfs(&config.source_folder)?;
    organize_files(config, files, extractor, progress).await
}

/// Organize already listed `files`.
///
/// 1. Label each file and bucket it under its label
/// 2. Unify labels until nothing merges
/// 3. Stage and zip the groups
#[instrument(skip_all, fields(folder = %config.source_folder.display(), strategy = %config.strategy))]
pub async fn organize_files<P, C>(
    config: &OrganizeConfig,
    files: Vec<PathBuf>,
    extractor: &ContextExtractor<P, C>,
    progress: &dyn ProgressReporter,
) -> Result<OrganizeResult>
where
    P: DocumentParser,
    C: CompletionClient,
{
    let start = Instant::now();
    let total = files.len();
    info!(files = total, model = extractor.model(), "starting organize pipeline");

    // --- Phase 1: Label ---
    progress.phase("Extracting context");
    let mut groups = Groups::new();
    let mut labels = Vec::with_capacity(total);
    let mut skipped = Vec::new();
    let mut last_error = None;

    for (i, file) in files.iter().enumerate() {
        match extractor.label(file).await {
            Ok(labeled) => {
                debug!(file = %file.display(), label = %labeled.label, "file labeled");
                progress.file_labeled(&labeled, i + 1, total);
                groups.insert(labeled.label.clone(), file.clone());
                labels.push(labeled);
            }
            Err(e) if config.on_error == ExtractionErrorPolicy::Abort => {
                warn!(file = %file.display(), error = %e, "labeling failed, aborting");
                return Err(e);
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "labeling failed, skipping file");
                progress.file_skipped(file, &e, i + 1, total);
                skipped.push(SkippedFile {
                    path: file.clone(),
                    error: e.to_string(),
                });
                last_error = Some(e);
            }
        }
    }

    if groups.is_empty() {
        if let Some(e) = last_error {
            warn!(files = total, "every file failed labeling");
            return Err(e);
        }
    }

    // --- Phase 2: Unify ---
    progress.phase("Unifying groups");
    let before = groups.len();
    let groups = unify(groups, config.strategy);
    info!(before, after = groups.len(), "groups unified");
    progress.groups_unified(&groups);

    // --- Phase 3: Archive ---
    progress.phase("Writing archive");
    let loose: Vec<PathBuf> = skipped.iter().map(|s| s.path.clone()).collect();
    let report = build_archive(&groups, &loose, &config.output_archive)?;

    let result = OrganizeResult {
        archive_path: report.archive_path,
        groups,
        labels,
        skipped,
        copy_failures: report.copy_failures,
        file_count: total,
        elapsed: start.elapsed(),
    };

    info!(
        archive = %result.archive_path.display(),
        groups = result.groups.len(),
        skipped = result.skipped.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "organize pipeline complete"
    );

    progress.done(&result);
    Ok(result)
}
