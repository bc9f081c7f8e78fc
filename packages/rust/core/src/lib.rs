//! Pipeline orchestration for pdfsorter.
//!
//! Ties folder scanning, per-file labeling, group unification, and archive
//! writing into one run, and owns the model server for its duration.

pub mod pipeline;
pub mod scan;
pub mod server;

pub use pipeline::{
    OrganizeConfig, OrganizeResult, ProgressReporter, RunConfig, SilentProgress, SkippedFile,
    organize, organize_files, organize_folder,
};
pub use scan::list_pdfs;
pub use server::ModelServer;
