//! Plain HTTP fetch with a byte cap.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;

use super::charset::{charset_from_content_type, decode_body, sniff_charset};
use super::{FetchError, FetchResult, FetchedContent, Fetcher};
use crate::config::CrawlConfig;
use crate::utils::{ACCEPT_HEADER, same_location};

/// One-shot GET per URL through a shared `reqwest` client.
///
/// Redirects are followed by the client and the final URL is reported. At
/// most `max_bytes` of the body are kept.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl StaticFetcher {
    /// Build a fetcher from the crawl configuration.
    ///
    /// # Errors
    ///
    /// Fails if the User-Agent is not a valid header value or the TLS
    /// backend cannot be initialized.
    pub fn new(config: &CrawlConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .default_headers(headers)
            .timeout(config.timeout())
            .redirect(Policy::limited(10))
            .danger_accept_invalid_certs(config.ignore_https_errors())
            .build()?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes(),
        })
    }
}

fn classify(err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else if err.is_redirect() || err.is_decode() {
        FetchError::Protocol(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&mut self, url: &str) -> Result<FetchResult, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Protocol(format!("HTTP {status}")));
        }

        // Keep the caller's spelling unless a redirect moved us
        let landed = response.url().as_str();
        let final_url = if same_location(url, landed) {
            url.to_string()
        } else {
            landed.to_string()
        };
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        // Read one byte past the cap so truncation is detectable, then cut.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| classify(&e))? {
            let room = (self.max_bytes + 1).saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() > self.max_bytes {
                break;
            }
        }
        if body.len() > self.max_bytes {
            debug!(
                target: "sitescout::fetch",
                "Truncating {final_url} to {} bytes",
                self.max_bytes
            );
            body.truncate(self.max_bytes);
        }

        let charset = content_type
            .as_deref()
            .and_then(charset_from_content_type)
            .or_else(|| sniff_charset(&body));
        let html = decode_body(&body, charset.as_deref());

        Ok(FetchResult {
            final_url,
            content_type,
            charset,
            content: FetchedContent::Html(html),
        })
    }
}
