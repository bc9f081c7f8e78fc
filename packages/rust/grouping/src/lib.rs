//! Label buckets and label unification for pdfsorter.
//!
//! Files are collected into [`Groups`] (label → ordered file list) one at a
//! time, then [`unify`] collapses labels that name the same topic until no
//! two remaining labels are similar under the chosen [`UnifyStrategy`].
//!
//! [`UnifyStrategy`]: pdfsorter_shared::UnifyStrategy

mod unify;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

pub use unify::{
    MAX_PASSES, MergePolicy, SubstringContainment, WordIntersection, common_words, unify,
    unify_pass, unify_with,
};

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Insertion-ordered mapping from a label to the files carrying it.
///
/// Equality compares keys and file lists but ignores key order, which is what
/// the unification fixpoint check needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups {
    inner: IndexMap<String, Vec<PathBuf>>,
}

impl Groups {
    /// Create an empty set of groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `file` to the bucket for `label`, creating the bucket on first use.
    pub fn insert(&mut self, label: impl Into<String>, file: impl Into<PathBuf>) {
        self.inner.entry(label.into()).or_default().push(file.into());
    }

    /// Append several files to the bucket for `label`.
    pub fn extend_label<I>(&mut self, label: impl Into<String>, files: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.inner.entry(label.into()).or_default().extend(files);
    }

    /// Files grouped under `label`, if any.
    pub fn get(&self, label: &str) -> Option<&[PathBuf]> {
        self.inner.get(label).map(Vec::as_slice)
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Total number of files across all labels.
    pub fn file_count(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }

    /// Labels in first-seen order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// `(label, files)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.inner
            .iter()
            .map(|(label, files)| (label.as_str(), files.as_slice()))
    }

    /// Whether `file` sits in any bucket.
    pub fn contains_file(&self, file: &Path) -> bool {
        self.inner.values().any(|files| files.iter().any(|f| f == file))
    }
}

impl FromIterator<(String, Vec<PathBuf>)> for Groups {
    /// Later pairs with an already seen label extend that label's files.
    fn from_iter<T: IntoIterator<Item = (String, Vec<PathBuf>)>>(iter: T) -> Self {
        let mut groups = Groups::new();
        for (label, files) in iter {
            groups.extend_label(label, files);
        }
        groups
    }
}

impl IntoIterator for Groups {
    type Item = (String, Vec<PathBuf>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<PathBuf>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
