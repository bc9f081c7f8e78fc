//! Document parsers: raw file bytes → plain text.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use pdfsorter_shared::{ExtractConfig, ParserKind, PdfSorterError, Result};
use reqwest::Client;
use tracing::debug;

/// User-Agent string for parser requests.
const USER_AGENT: &str = concat!("pdfsorter/", env!("CARGO_PKG_VERSION"));

/// Timeout for a single Tika request.
const TIKA_TIMEOUT_SECS: u64 = 60;

/// Extracts readable text from a document.
///
/// `path` is only used for error context; the text comes from `bytes`.
/// An empty string is a valid answer (scanned or image-only documents).
pub trait DocumentParser: Send + Sync {
    fn extract_text(
        &self,
        path: &Path,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// pdf-extract
// ---------------------------------------------------------------------------

/// In-process PDF text extraction with the `pdf-extract` crate.
///
/// Parsing runs on the blocking pool; a panic inside the parser surfaces as
/// an extraction error for that file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractParser;

impl DocumentParser for PdfExtractParser {
    async fn extract_text(&self, path: &Path, bytes: Vec<u8>) -> Result<String> {
        debug!(path = %path.display(), bytes = bytes.len(), "extracting text with pdf-extract");

        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| PdfSorterError::extraction(path, format!("parser task failed: {e}")))?
            .map_err(|e| PdfSorterError::extraction(path, format!("PDF extraction failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Tika
// ---------------------------------------------------------------------------

/// Text extraction through an Apache Tika server (`PUT /tika`).
#[derive(Debug, Clone)]
pub struct TikaParser {
    client: Client,
    base_url: String,
}

impl TikaParser {
    /// Create a parser talking to the Tika server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TIKA_TIMEOUT_SECS))
            .build()
            .map_err(|e| PdfSorterError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl DocumentParser for TikaParser {
    async fn extract_text(&self, path: &Path, bytes: Vec<u8>) -> Result<String> {
        let url = format!("{}/tika", self.base_url);
        debug!(path = %path.display(), %url, "extracting text with tika");

        let response = self
            .client
            .put(&url)
            .header(reqwest::header::ACCEPT, "text/plain")
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(bytes)
            .send()
            .await
            .map_err(|e| PdfSorterError::extraction(path, format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PdfSorterError::extraction(
                path,
                format!("{url}: HTTP {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| PdfSorterError::extraction(path, format!("{url}: failed to read body: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// Parser chosen at runtime from `[extract] parser`.
#[derive(Debug, Clone)]
pub enum ParserBackend {
    PdfExtract(PdfExtractParser),
    Tika(TikaParser),
}

impl ParserBackend {
    /// Build the backend named by the config.
    pub fn from_config(config: &ExtractConfig) -> Result<Self> {
        match config.parser {
            ParserKind::PdfExtract => Ok(Self::PdfExtract(PdfExtractParser)),
            ParserKind::Tika => Ok(Self::Tika(TikaParser::new(&config.tika_url)?)),
        }
    }
}

impl DocumentParser for ParserBackend {
    async fn extract_text(&self, path: &Path, bytes: Vec<u8>) -> Result<String> {
        match self {
            Self::PdfExtract(parser) => parser.extract_text(path, bytes).await,
            Self::Tika(parser) => parser.extract_text(path, bytes).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_bytes, header, method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn backend_follows_config() {
        let mut config = ExtractConfig::default();
        assert!(matches!(
            ParserBackend::from_config(&config).unwrap(),
            ParserBackend::PdfExtract(_)
        ));

        config.parser = ParserKind::Tika;
        config.tika_url = "http://tika.local:9998/".into();
        match ParserBackend::from_config(&config).unwrap() {
            ParserBackend::Tika(tika) => assert_eq!(tika.base_url, "http://tika.local:9998"),
            other => panic!("expected Tika, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pdf_extract_rejects_garbage() {
        let err = PdfExtractParser
            .extract_text(Path::new("broken.pdf"), b"not a pdf at all".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfSorterError::Extraction { .. }));
        assert!(err.to_string().contains("broken.pdf"));
    }

    #[tokio::test]
    async fn tika_returns_plain_text() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(url_path("/tika"))
            .and(header("accept", "text/plain"))
            .and(body_bytes(b"%PDF-1.7 fake".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_string("Invoice number 42\n"))
            .expect(1)
            .mount(&server)
            .await;

        let parser = TikaParser::new(&server.uri()).unwrap();
        let text = parser
            .extract_text(Path::new("a.pdf"), b"%PDF-1.7 fake".to_vec())
            .await
            .unwrap();
        assert_eq!(text, "Invoice number 42\n");
    }

    #[tokio::test]
    async fn tika_http_error_is_extraction_error() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(url_path("/tika"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let parser = TikaParser::new(&server.uri()).unwrap();
        let err = parser
            .extract_text(Path::new("locked.pdf"), vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, PdfSorterError::Extraction { .. }));
        assert!(err.to_string().contains("422"));
        assert_eq!(err.exit_code(), 2);
    }
}
