//! Document labeling for pdfsorter.
//!
//! Turns a PDF into a short topic label: the text is pulled out by a
//! [`DocumentParser`], a snippet of it is sent to a [`CompletionClient`]
//! with a fixed prompt, and [`normalize_label`] strips the answer down to the
//! text between the `**` markers.

pub mod completion;
pub mod context;
pub mod normalize;
pub mod parser;

pub use completion::{CompletionClient, OllamaClient};
pub use context::{ContextExtractor, FileLabel, build_prompt, snippet};
pub use normalize::normalize_label;
pub use parser::{DocumentParser, ParserBackend, PdfExtractParser, TikaParser};
