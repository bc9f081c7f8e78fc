//! Per-file context extraction: file → raw model answer → label.

use std::path::{Path, PathBuf};

use pdfsorter_shared::{NO_CONTENT_LABEL, PdfSorterError, Result};
use tracing::{debug, instrument};

use crate::completion::CompletionClient;
use crate::normalize::normalize_label;
use crate::parser::DocumentParser;

/// Default number of leading characters sent to the model.
pub const DEFAULT_SNIPPET_CHARS: usize = 1000;

/// Instruction placed in front of the document snippet.
const PROMPT_PREAMBLE: &str = "Extract the core context of the following text in exactly one or two words. \
Return only the one or two words, enclosed in double asterisks like **Topic**, \
with no extra commentary:\n\n";

/// Label produced for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLabel {
    /// The input file.
    pub path: PathBuf,
    /// Model answer as returned (trimmed), or the no-content sentinel.
    pub raw: String,
    /// Canonical label after normalization.
    pub label: String,
}

/// Leading `max_chars` characters of `text`, trimmed.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    head.trim().to_string()
}

/// The fixed labeling prompt for a document snippet.
pub fn build_prompt(snippet: &str) -> String {
    format!("{PROMPT_PREAMBLE}{snippet}")
}

/// Wraps the parse → prompt → complete round trip for a single file.
#[derive(Debug, Clone)]
pub struct ContextExtractor<P, C> {
    parser: P,
    client: C,
    model: String,
    snippet_chars: usize,
}

impl<P, C> ContextExtractor<P, C>
where
    P: DocumentParser,
    C: CompletionClient,
{
    pub fn new(parser: P, client: C, model: impl Into<String>) -> Self {
        Self {
            parser,
            client,
            model: model.into(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    /// Override how much document text goes into the prompt.
    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Raw model answer for already loaded document bytes.
    ///
    /// Returns [`NO_CONTENT_LABEL`] without calling the model when the
    /// document yields no text, or when the model answers with nothing.
    pub async fn raw_context_from_bytes(&self, path: &Path, bytes: Vec<u8>) -> Result<String> {
        let text = self.parser.extract_text(path, bytes).await?;
        let snippet = snippet(&text, self.snippet_chars);

        if snippet.is_empty() {
            debug!(path = %path.display(), "no extractable text");
            return Ok(NO_CONTENT_LABEL.to_string());
        }

        let prompt = build_prompt(&snippet);
        let answer = self.client.complete(&self.model, &prompt).await?;
        let answer = answer.trim();

        if answer.is_empty() {
            Ok(NO_CONTENT_LABEL.to_string())
        } else {
            Ok(answer.to_string())
        }
    }

    /// Raw model answer for the file at `path`.
    pub async fn raw_context(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PdfSorterError::io(path, e))?;
        self.raw_context_from_bytes(path, bytes).await
    }

    /// Label the file at `path`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn label(&self, path: &Path) -> Result<FileLabel> {
        let raw = self.raw_context(path).await?;
        let mut label = normalize_label(&raw);
        if label.is_empty() {
            label = NO_CONTENT_LABEL.to_string();
        }

        Ok(FileLabel {
            path: path.to_path_buf(),
            raw,
            label,
        })
    }
}
