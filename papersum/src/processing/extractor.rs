use std::time::Duration;

use futures::StreamExt;
use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{PapersumError, Result};

/// Document kinds the extractor can turn into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Pdf,
    Html,
    Markdown,
    Text,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub title: Option<String>,
    pub kind: ContentKind,
}

/// Downloads a URL and reduces it to plain text.
///
/// Every download problem (DNS, TLS, timeout, non-2xx, oversized body) is a
/// [`PapersumError::Fetch`]; a body that yields no usable text is a
/// [`PapersumError::NoContent`].
pub struct ContentExtractor {
    http_client: reqwest::Client,
    max_bytes: usize,
}

impl ContentExtractor {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PapersumError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            max_bytes: config.max_bytes,
        })
    }

    pub async fn extract(&self, url_str: &str) -> Result<ExtractedText> {
        let url = Url::parse(url_str)?;
        let (content_type, bytes) = self.download(&url).await?;

        let kind = Self::classify(content_type.as_deref(), url.path(), &bytes).ok_or_else(|| {
            PapersumError::NoContent(format!(
                "unsupported content type: {}",
                content_type.as_deref().unwrap_or("unknown")
            ))
        })?;

        tracing::debug!(
            url = %url,
            kind = ?kind,
            bytes = bytes.len(),
            "Downloaded source document"
        );

        let extracted = match kind {
            ContentKind::Pdf => ExtractedText {
                text: Self::extract_from_pdf(bytes).await?,
                title: None,
                kind,
            },
            ContentKind::Html => Self::extract_from_html(&String::from_utf8_lossy(&bytes)),
            ContentKind::Markdown | ContentKind::Text => ExtractedText {
                text: String::from_utf8_lossy(&bytes).trim().to_string(),
                title: None,
                kind,
            },
        };

        if extracted.text.trim().is_empty() {
            return Err(PapersumError::NoContent(
                "extracted text is empty".to_string(),
            ));
        }

        Ok(extracted)
    }

    async fn download(&self, url: &Url) -> Result<(Option<String>, Vec<u8>)> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PapersumError::Fetch(describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PapersumError::Fetch(format!("HTTP {status}")));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(PapersumError::Fetch(format!(
                    "document is {length} bytes, limit is {}",
                    self.max_bytes
                )));
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_lowercase());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PapersumError::Fetch(describe_request_error(&e)))?;
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(PapersumError::Fetch(format!(
                    "document exceeds {} bytes",
                    self.max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok((content_type, bytes))
    }

    /// Header first, then path suffix, then magic bytes. `None` means the
    /// document is of a kind nothing here can read.
    fn classify(content_type: Option<&str>, path: &str, bytes: &[u8]) -> Option<ContentKind> {
        if let Some(content_type) = content_type {
            if content_type.contains("application/pdf") {
                return Some(ContentKind::Pdf);
            } else if content_type.contains("text/html")
                || content_type.contains("application/xhtml")
            {
                return Some(ContentKind::Html);
            } else if content_type.contains("text/markdown") {
                return Some(ContentKind::Markdown);
            } else if content_type.contains("text/plain") {
                return Some(ContentKind::Text);
            } else if !is_generic_content_type(content_type) {
                return None;
            }
        }

        let path = path.to_lowercase();
        if path.ends_with(".pdf") {
            return Some(ContentKind::Pdf);
        } else if path.ends_with(".html") || path.ends_with(".htm") {
            return Some(ContentKind::Html);
        } else if path.ends_with(".md") || path.ends_with(".markdown") {
            return Some(ContentKind::Markdown);
        } else if path.ends_with(".txt") {
            return Some(ContentKind::Text);
        }

        Self::detect_kind_from_bytes(bytes)
    }

    fn detect_kind_from_bytes(bytes: &[u8]) -> Option<ContentKind> {
        if let Some(kind) = infer::get(bytes) {
            return match kind.mime_type() {
                "application/pdf" => Some(ContentKind::Pdf),
                "text/html" => Some(ContentKind::Html),
                _ => None,
            };
        }

        let text = std::str::from_utf8(bytes).ok()?;
        if Self::looks_like_html(text) {
            Some(ContentKind::Html)
        } else {
            Some(ContentKind::Text)
        }
    }

    async fn extract_from_pdf(bytes: Vec<u8>) -> Result<String> {
        // pdf-extract is CPU-bound and panics on some malformed files.
        let handle = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes));

        match handle.await {
            Ok(Ok(text)) => Ok(Self::clean_text(&text)),
            Ok(Err(e)) => Err(PapersumError::NoContent(format!(
                "PDF text extraction failed: {e}"
            ))),
            Err(e) => Err(PapersumError::NoContent(format!(
                "PDF text extraction aborted: {e}"
            ))),
        }
    }

    pub fn extract_from_html(html: &str) -> ExtractedText {
        let document = Html::parse_document(html);

        ExtractedText {
            title: Self::extract_title(&document),
            text: Self::extract_text(&document),
            kind: ContentKind::Html,
        }
    }

    fn extract_title(document: &Html) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;
        document
            .select(&title_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn extract_text(document: &Html) -> String {
        const SKIPPED: [&str; 9] = [
            "script", "style", "noscript", "nav", "header", "footer", "aside", "iframe", "svg",
        ];

        let content_root = Selector::parse("article, main, #content, .content")
            .ok()
            .and_then(|selector| document.select(&selector).next())
            .or_else(|| {
                Selector::parse("body")
                    .ok()
                    .and_then(|selector| document.select(&selector).next())
            });

        let Some(root) = content_root else {
            return Self::clean_text(&document.root_element().text().collect::<String>());
        };

        let mut text = String::new();

        for node in root.descendants() {
            let skipped = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| SKIPPED.contains(&element.name()))
            });
            if skipped {
                continue;
            }

            if let Some(text_node) = node.value().as_text() {
                let content = text_node.trim();
                if !content.is_empty() {
                    if !text.is_empty() && !text.ends_with(' ') && !text.ends_with('\n') {
                        text.push(' ');
                    }
                    text.push_str(content);
                }
            }
        }

        Self::clean_text(&text)
    }

    fn clean_text(text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut prev_was_whitespace = false;
        let mut consecutive_newlines = 0;

        for c in text.chars() {
            if c == '\n' {
                consecutive_newlines += 1;
                if consecutive_newlines <= 2 {
                    result.push(c);
                }
                prev_was_whitespace = true;
            } else if c.is_whitespace() {
                consecutive_newlines = 0;
                if !prev_was_whitespace {
                    result.push(' ');
                    prev_was_whitespace = true;
                }
            } else {
                consecutive_newlines = 0;
                result.push(c);
                prev_was_whitespace = false;
            }
        }

        result.trim().to_string()
    }

    fn looks_like_html(content: &str) -> bool {
        let head: String = content.trim_start().chars().take(64).collect();
        let head = head.to_lowercase();
        head.starts_with("<!doctype html") || head.starts_with("<html")
    }
}

fn is_generic_content_type(content_type: &str) -> bool {
    content_type.contains("application/octet-stream")
        || content_type.contains("binary/octet-stream")
        || content_type.contains("application/x-download")
        || content_type.contains("application/force-download")
}

fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn extractor() -> ContentExtractor {
        ContentExtractor::new(&FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_classify_prefers_content_type() {
        assert_eq!(
            ContentExtractor::classify(Some("application/pdf"), "/paper", b""),
            Some(ContentKind::Pdf)
        );
        assert_eq!(
            ContentExtractor::classify(Some("text/html; charset=utf-8"), "/paper.pdf", b""),
            Some(ContentKind::Html)
        );
        assert_eq!(
            ContentExtractor::classify(Some("image/png"), "/figure.png", b""),
            None
        );
    }

    #[test]
    fn test_classify_falls_back_to_suffix_then_bytes() {
        assert_eq!(
            ContentExtractor::classify(Some("application/octet-stream"), "/a/Paper.PDF", b""),
            Some(ContentKind::Pdf)
        );
        assert_eq!(
            ContentExtractor::classify(None, "/download", b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n"),
            Some(ContentKind::Pdf)
        );
        assert_eq!(
            ContentExtractor::classify(None, "/download", b"<!DOCTYPE html><html></html>"),
            Some(ContentKind::Html)
        );
        assert_eq!(
            ContentExtractor::classify(None, "/notes", b"just some words"),
            Some(ContentKind::Text)
        );
    }

    #[test]
    fn test_html_extraction_skips_chrome() {
        let html = r#"<!DOCTYPE html>
            <html><head><title> A Study of Naps </title></head>
            <body>
              <nav>Home | About</nav>
              <article><h1>Naps</h1><p>Short naps   improve recall.</p>
              <script>var tracking = 1;</script></article>
              <footer>Copyright</footer>
            </body></html>"#;

        let extracted = ContentExtractor::extract_from_html(html);
        assert_eq!(extracted.title.as_deref(), Some("A Study of Naps"));
        assert_eq!(extracted.text, "Naps Short naps improve recall.");
        assert_eq!(extracted.kind, ContentKind::Html);
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(
            ContentExtractor::clean_text("  a \t b\n\n\n\nc  "),
            "a b\n\nc"
        );
    }

    #[tokio::test]
    async fn test_extract_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("  Sleep helps memory.  "),
            )
            .mount(&server)
            .await;

        let extracted = extractor()
            .extract(&format!("{}/notes.txt", server.uri()))
            .await
            .unwrap();
        assert_eq!(extracted.text, "Sleep helps memory.");
        assert_eq!(extracted.kind, ContentKind::Text);
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = extractor()
            .extract(&format!("{}/missing.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PapersumError::Fetch(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_empty_body_is_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty.html"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "<html><body><script>x()</script></body></html>",
                    "text/html",
                ),
            )
            .mount(&server)
            .await;

        let err = extractor()
            .extract(&format!("{}/empty.html", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PapersumError::NoContent(_)));
    }

    #[tokio::test]
    async fn test_oversized_body_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("x".repeat(64)),
            )
            .mount(&server)
            .await;

        let config = FetchConfig {
            max_bytes: 16,
            ..FetchConfig::default()
        };
        let err = ContentExtractor::new(&config)
            .unwrap()
            .extract(&format!("{}/big.txt", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PapersumError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken.pdf"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    b"%PDF-1.4 this is not really a pdf".to_vec(),
                    "application/pdf",
                ),
            )
            .mount(&server)
            .await;

        let err = extractor()
            .extract(&format!("{}/broken.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PapersumError::NoContent(_)));
    }
}
