//! Input folder listing.

use std::path::{Path, PathBuf};

use pdfsorter_shared::{PdfSorterError, Result};
use tracing::debug;

/// PDF files directly inside `folder`, sorted by file name.
///
/// Matches `*.pdf` case-insensitively and ignores subdirectories. A missing
/// or unreadable folder is a configuration error.
pub fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(PdfSorterError::config(format!(
            "source folder '{}' does not exist or is not a directory",
            folder.display()
        )));
    }

    let entries = std::fs::read_dir(folder).map_err(|e| {
        PdfSorterError::config(format!("cannot read source folder '{}': {e}", folder.display()))
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PdfSorterError::io(folder, e))?;
        let path = entry.path();
        let is_pdf = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase().ends_with(".pdf"))
            .unwrap_or(false);

        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }

    pdfs.sort();
    debug!(folder = %folder.display(), count = pdfs.len(), "listed PDF files");
    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_pdf_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "A.PDF", "notes.txt", "c.Pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let names: Vec<String> = list_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf", "c.Pdf"]);
    }

    #[test]
    fn missing_folder_is_config_error() {
        let err = list_pdfs(Path::new("/no/such/folder")).unwrap_err();
        assert!(matches!(err, PdfSorterError::Config { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn empty_folder_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_pdfs(dir.path()).unwrap().is_empty());
    }
}
