//! Web page loader.
//!
//! Fetches a URL and keeps the text under a CSS selector (the whole `<body>`
//! by default) as a single document tagged with its `source`.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use scraper::{Html, Selector};

use super::document::Document;
use crate::core::config::LoaderConfig;
use crate::core::errors::RagError;

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Vec<Document>, RagError>;
}

pub struct WebLoader {
    client: Client,
    selector: String,
}

impl WebLoader {
    pub fn new(config: &LoaderConfig) -> Result<Self, RagError> {
        // Reject a bad selector up front rather than after the download.
        parse_selector(&config.selector)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(RagError::internal)?;

        Ok(Self {
            client,
            selector: config.selector.clone(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, RagError> {
        let parsed = Url::parse(url)
            .map_err(|e| RagError::Fetch(format!("Invalid URL {}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RagError::Fetch(format!("Unsupported URL scheme: {}", url)));
        }

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                RagError::Fetch(format!("Timeout fetching {}", url))
            } else {
                RagError::Fetch(format!("Failed to fetch {}: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RagError::Fetch(format!("HTTP {} for {}", status.as_u16(), url)));
        }

        response
            .text()
            .await
            .map_err(|e| RagError::Fetch(format!("Failed to read body of {}: {}", url, e)))
    }
}

#[async_trait]
impl DocumentLoader for WebLoader {
    async fn load(&self, url: &str) -> Result<Vec<Document>, RagError> {
        tracing::info!("Loading {}", url);
        let html = self.fetch(url).await?;
        let text = extract_text(&html, &self.selector)?;
        tracing::info!("Loaded {} characters from {}", text.chars().count(), url);

        Ok(vec![Document::from_source(text, url)])
    }
}

fn parse_selector(selector: &str) -> Result<Selector, RagError> {
    Selector::parse(selector)
        .map_err(|e| RagError::InvalidInput(format!("Invalid CSS selector '{}': {}", selector, e)))
}

/// Text content of every element matching `selector`, in document order,
/// with script-like elements dropped and whitespace tidied line by line.
pub fn extract_text(html: &str, selector: &str) -> Result<String, RagError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);

    let mut raw = String::new();
    for element in document.select(&selector) {
        for node in element.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let skipped = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
            });
            if !skipped {
                raw.push_str(text);
            }
        }
        raw.push('\n');
    }

    Ok(tidy_whitespace(&raw))
}

fn tidy_whitespace(text: &str) -> String {
    static INLINE_SPACE: OnceLock<Regex> = OnceLock::new();
    let inline_space = INLINE_SPACE.get_or_init(|| {
        Regex::new(r"[ \t\u{00A0}\u{3000}]+").expect("static regex")
    });

    text.lines()
        .map(|line| inline_space.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>LangChain</title>
            <style>body { color: red; }</style>
        </head>
        <body>
            <script>var tracking = 1;</script>
            <h1>LangChain</h1>
            <p>LangChain   は大規模言語モデルを使った
            アプリケーション開発のためのフレームワークである。</p>
            <div id="license"><p>ライセンス: MIT License</p></div>
            <noscript>Enable JavaScript</noscript>
        </body>
        </html>
    "#;

    #[test]
    fn extracts_body_text_without_scripts() {
        let text = extract_text(SAMPLE_HTML, "body").unwrap();

        assert!(text.contains("LangChain は大規模言語モデルを使った"));
        assert!(text.contains("ライセンス: MIT License"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Enable JavaScript"));
        assert!(!text.lines().any(|line| line.trim().is_empty()));
    }

    #[test]
    fn narrower_selector_limits_text() {
        let text = extract_text(SAMPLE_HTML, "#license").unwrap();
        assert_eq!(text, "ライセンス: MIT License");
    }

    #[test]
    fn unmatched_selector_yields_empty_text() {
        let text = extract_text(SAMPLE_HTML, "article").unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn invalid_selector_is_rejected() {
        assert!(matches!(
            extract_text(SAMPLE_HTML, "p[["),
            Err(RagError::InvalidInput(_))
        ));
        let config = LoaderConfig {
            selector: "p[[".to_string(),
            ..LoaderConfig::default()
        };
        assert!(WebLoader::new(&config).is_err());
    }

    #[tokio::test]
    async fn invalid_url_is_a_fetch_error() {
        let loader = WebLoader::new(&LoaderConfig::default()).unwrap();

        let err = loader.load("not a url").await.unwrap_err();
        assert!(matches!(err, RagError::Fetch(_)));

        let err = loader.load("ftp://example.com/file").await.unwrap_err();
        assert!(matches!(err, RagError::Fetch(_)));
    }
}
