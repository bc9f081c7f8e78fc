//! Core domain constants and option enums shared across pdfsorter crates.

use serde::{Deserialize, Serialize};

use crate::error::PdfSorterError;

/// Label assigned to documents with no extractable text (or a blank model answer).
pub const NO_CONTENT_LABEL: &str = "NoContent";

/// Folder name used when a label sanitizes to nothing.
pub const UNKNOWN_FOLDER: &str = "Unknown";

/// Default name of the produced archive.
pub const DEFAULT_OUTPUT_ARCHIVE: &str = "organized_pdfs.zip";

// ---------------------------------------------------------------------------
// UnifyStrategy
// ---------------------------------------------------------------------------

/// Policy used to decide whether two labels describe the same group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnifyStrategy {
    /// Merge when the lowercase word sets intersect; key becomes the common words.
    #[default]
    WordIntersection,
    /// Merge when one label contains the other; key stays the shorter one.
    Substring,
}

impl UnifyStrategy {
    /// Config/CLI spelling of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WordIntersection => "word-intersection",
            Self::Substring => "substring",
        }
    }
}

impl std::fmt::Display for UnifyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UnifyStrategy {
    type Err = PdfSorterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word-intersection" | "words" => Ok(Self::WordIntersection),
            "substring" => Ok(Self::Substring),
            other => Err(PdfSorterError::config(format!(
                "unknown grouping strategy '{other}': expected 'word-intersection' or 'substring'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ParserKind
// ---------------------------------------------------------------------------

/// Which document parser turns PDF bytes into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserKind {
    /// In-process parsing with the `pdf-extract` crate.
    #[default]
    PdfExtract,
    /// Remote Apache Tika server.
    Tika,
}

// ---------------------------------------------------------------------------
// ExtractionErrorPolicy
// ---------------------------------------------------------------------------

/// What to do when labeling a single file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionErrorPolicy {
    /// Log the failure, keep the file unsorted, continue with the next one.
    #[default]
    Skip,
    /// Stop the run on the first failure.
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_config_spellings() {
        assert_eq!(
            "word-intersection".parse::<UnifyStrategy>().unwrap(),
            UnifyStrategy::WordIntersection
        );
        assert_eq!("Substring".parse::<UnifyStrategy>().unwrap(), UnifyStrategy::Substring);
        assert!("embedding".parse::<UnifyStrategy>().is_err());
    }

    #[test]
    fn strategy_display_matches_parse() {
        for strategy in [UnifyStrategy::WordIntersection, UnifyStrategy::Substring] {
            let parsed: UnifyStrategy = strategy.to_string().parse().unwrap();
            assert_eq!(parsed, strategy);
        }
    }
}
