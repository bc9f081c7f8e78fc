//! Archive builder for organized PDFs.
//!
//! Materializes unified groups into a temporary staging directory
//! (one folder per multi-file label, singletons flat at the root) and
//! compresses that tree into a single zip file.
//!
//! ```text
//! organized_pdfs.zip
//! ├── Invoice/
//! │   ├── invoice-2023.pdf
//! │   └── invoice-2024.pdf
//! └── travel.pdf
//! ```

mod compress;
mod sanitize;

use std::fs::{self, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use pdfsorter_grouping::Groups;
use pdfsorter_shared::{PdfSorterError, Result};
use tracing::{debug, info, instrument, warn};

pub use sanitize::sanitize_folder_name;

/// Prefix of the staging directory name.
const STAGING_PREFIX: &str = "pdfsorter-staging-";

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A file that could not be copied into the staging area.
#[derive(Debug, Clone)]
pub struct CopyFailure {
    /// Source file.
    pub file: PathBuf,
    /// Intended destination inside the staging area.
    pub destination: PathBuf,
    /// Error message.
    pub error: String,
}

/// Outcome of staging files into a directory.
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    /// Folder names created for multi-file labels, in group order.
    pub folders: Vec<String>,
    /// Files copied successfully.
    pub files_copied: usize,
    /// Files skipped because their copy failed.
    pub copy_failures: Vec<CopyFailure>,
}

/// Outcome of a full archive build.
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    /// Path of the written zip file.
    pub archive_path: PathBuf,
    /// Folder names created for multi-file labels, in group order.
    pub folders: Vec<String>,
    /// Files copied into the archive.
    pub files_copied: usize,
    /// Files left out because their copy failed.
    pub copy_failures: Vec<CopyFailure>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The archive path for a requested output name: the extension is always `.zip`.
pub fn archive_path_for(output: &Path) -> PathBuf {
    output.with_extension("zip")
}

/// Stage `groups` (plus `loose` files, placed at the root) in a temporary
/// directory and zip it to `output`.
///
/// Copy failures are logged and reported, never fatal. The staging directory
/// is removed before returning, whether or not the build succeeded.
pub fn build_archive(groups: &Groups, loose: &[PathBuf], output: &Path) -> Result<ArchiveReport> {
    build_archive_in(groups, loose, output, &std::env::temp_dir())
}

/// [`build_archive`] with the staging directory created under `staging_parent`.
#[instrument(skip_all, fields(output = %output.display(), groups = groups.len()))]
pub fn build_archive_in(
    groups: &Groups,
    loose: &[PathBuf],
    output: &Path,
    staging_parent: &Path,
) -> Result<ArchiveReport> {
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(staging_parent)
        .map_err(|e| PdfSorterError::io(staging_parent, e))?;

    debug!(staging = %staging.path().display(), "created staging directory");

    let stage_report = stage(groups, loose, staging.path())?;
    let archive_path = write_zip(staging.path(), output)?;

    if let Err(e) = staging.close() {
        warn!(error = %e, "failed to remove staging directory");
    }

    info!(
        archive = %archive_path.display(),
        folders = stage_report.folders.len(),
        files = stage_report.files_copied,
        failures = stage_report.copy_failures.len(),
        "archive written"
    );

    Ok(ArchiveReport {
        archive_path,
        folders: stage_report.folders,
        files_copied: stage_report.files_copied,
        copy_failures: stage_report.copy_failures,
    })
}

/// Copy grouped files into `root`.
///
/// Labels with more than one file get a subfolder named after the sanitized
/// label; single files and `loose` files are copied into `root` itself.
pub fn stage(groups: &Groups, loose: &[PathBuf], root: &Path) -> Result<StageReport> {
    let mut report = StageReport::default();

    for (label, files) in groups.iter() {
        let target_dir = if files.len() > 1 {
            let folder = sanitize_folder_name(label);
            let dir = root.join(&folder);
            fs::create_dir_all(&dir).map_err(|e| PdfSorterError::io(&dir, e))?;
            debug!(label, %folder, files = files.len(), "staging group folder");
            if !report.folders.contains(&folder) {
                report.folders.push(folder);
            }
            dir
        } else {
            root.to_path_buf()
        };

        for file in files {
            stage_file(file, &target_dir, &mut report);
        }
    }

    for file in loose {
        stage_file(file, root, &mut report);
    }

    Ok(report)
}

/// Copy `src` to `dst`, carrying over permissions and access/modification times.
///
/// Timestamps are best effort: a read-only copy may refuse them, which is
/// logged but does not fail the copy.
pub fn copy_preserving(src: &Path, dst: &Path) -> io::Result<u64> {
    let bytes = fs::copy(src, dst)?;

    let meta = fs::metadata(src)?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }

    let applied = fs::File::options()
        .write(true)
        .open(dst)
        .and_then(|f| f.set_times(times));
    if let Err(e) = applied {
        debug!(file = %dst.display(), error = %e, "could not preserve timestamps");
    }

    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stage_file(file: &Path, target_dir: &Path, report: &mut StageReport) {
    let Some(name) = file.file_name() else {
        report.copy_failures.push(CopyFailure {
            file: file.to_path_buf(),
            destination: target_dir.to_path_buf(),
            error: "path has no file name".into(),
        });
        return;
    };

    let destination = target_dir.join(name);
    match copy_preserving(file, &destination) {
        Ok(_) => report.files_copied += 1,
        Err(e) => {
            warn!(
                file = %file.display(),
                destination = %destination.display(),
                error = %e,
                "failed to copy file into staging area"
            );
            report.copy_failures.push(CopyFailure {
                file: file.to_path_buf(),
                destination,
                error: e.to_string(),
            });
        }
    }
}

/// Zip `staging` to the `.zip` form of `output` via a sibling temp file.
fn write_zip(staging: &Path, output: &Path) -> Result<PathBuf> {
    let archive_path = archive_path_for(output);
    let parent = archive_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    fs::create_dir_all(parent).map_err(|e| PdfSorterError::io(parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| PdfSorterError::io(parent, e))?;
    compress::zip_dir(staging, tmp.as_file_mut())?;

    tmp.persist(&archive_path)
        .map_err(|e| PdfSorterError::io(&archive_path, e.error))?;

    Ok(archive_path)
}
