//! Directory tree → zip file.

use std::fs::File;
use std::io;
use std::path::Path;

use pdfsorter_shared::{PdfSorterError, Result};
use tracing::{debug, trace};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Write every file and directory under `root` into a zip at `dest`.
///
/// Entry names are relative to `root` with `/` separators; directories get
/// their own entries. Entries are written in file-name order. Returns the
/// number of file entries written.
pub(crate) fn zip_dir(root: &Path, dest: &mut File) -> Result<usize> {
    let mut writer = ZipWriter::new(dest);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut files = 0;

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| PdfSorterError::Archive(format!("walking staging tree: {e}")))?;
        let name = entry_name(root, entry.path())?;

        if entry.file_type().is_dir() {
            trace!(%name, "adding directory");
            writer
                .add_directory(format!("{name}/"), options)
                .map_err(|e| PdfSorterError::Archive(format!("{name}: {e}")))?;
        } else {
            trace!(%name, "adding file");
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| PdfSorterError::Archive(format!("{name}: {e}")))?;
            let mut source =
                File::open(entry.path()).map_err(|e| PdfSorterError::io(entry.path(), e))?;
            io::copy(&mut source, &mut writer).map_err(|e| PdfSorterError::io(entry.path(), e))?;
            files += 1;
        }
    }

    writer
        .finish()
        .map_err(|e| PdfSorterError::Archive(format!("finishing archive: {e}")))?;

    debug!(files, "zip archive written");
    Ok(files)
}

/// `/`-joined path of `path` relative to `root`.
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        PdfSorterError::Archive(format!(
            "{} escapes staging root {}",
            path.display(),
            root.display()
        ))
    })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}
