use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::Proxy;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::ModelConfig;
use crate::drivers::GeminiDriver;
use crate::error::{Error, ErrorContext};
use crate::Result;

use super::{GenerationTransport, TransportError};

/// Gemini over HTTPS.
///
/// Holds one pooled async client. The blocking client is created on first
/// blocking use so async-only callers never spin up its background thread.
pub struct HttpTransport {
    client: reqwest::Client,
    blocking: OnceCell<reqwest::blocking::Client>,
    endpoint: Url,
    driver: GeminiDriver,
    timeout: Duration,
    proxy_url: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ModelConfig, api_key: &str) -> Result<Self> {
        let driver = GeminiDriver::new(config.model.clone(), config.generation.clone());
        let endpoint = Self::endpoint(&config.base_url, &driver, api_key)?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(Self::proxy(proxy_url)?);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            blocking: OnceCell::new(),
            endpoint,
            driver,
            timeout: config.timeout,
            proxy_url: config.proxy_url.clone(),
        })
    }

    fn endpoint(base_url: &str, driver: &GeminiDriver, api_key: &str) -> Result<Url> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), driver.generate_path());
        Url::parse_with_params(&raw, &[("key", api_key)]).map_err(|e| {
            Error::configuration_with_context(
                "invalid model base URL",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(e.to_string())
                    .with_source("http_transport"),
            )
        })
    }

    fn proxy(proxy_url: &str) -> Result<Proxy> {
        Proxy::all(proxy_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid proxy URL",
                ErrorContext::new()
                    .with_field_path("proxy_url")
                    .with_details(e.to_string())
                    .with_source("http_transport"),
            )
        })
    }

    fn blocking_client(&self) -> std::result::Result<&reqwest::blocking::Client, TransportError> {
        self.blocking.get_or_try_init(|| {
            let mut builder = reqwest::blocking::Client::builder().timeout(self.timeout);
            if let Some(proxy_url) = &self.proxy_url {
                let proxy =
                    Proxy::all(proxy_url).map_err(|e| TransportError::Other(e.to_string()))?;
                builder = builder.proxy(proxy);
            }
            builder
                .build()
                .map_err(|e| TransportError::Other(e.to_string()))
        })
    }

    fn parse_body(&self, body: &Value) -> std::result::Result<String, TransportError> {
        self.driver.parse_response(body)
    }
}

// The endpoint carries the API key in its query string; keep it out of Debug
// output and out of reqwest error messages.
impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("host", &self.endpoint.host_str())
            .field("model", &self.driver.model())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn http_error(e: reqwest::Error) -> TransportError {
    TransportError::Http(e.without_url())
}

#[async_trait]
impl GenerationTransport for HttpTransport {
    fn model(&self) -> &str {
        self.driver.model()
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, TransportError> {
        let body = self.driver.build_request(prompt);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status.as_u16(), &text));
        }

        let json: Value = response.json().await.map_err(http_error)?;
        self.parse_body(&json)
    }

    fn generate_blocking(&self, prompt: &str) -> std::result::Result<String, TransportError> {
        let body = self.driver.build_request(prompt);
        let response = self
            .blocking_client()?
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(TransportError::from_status(status.as_u16(), &text));
        }

        let json: Value = response.json().map_err(http_error)?;
        self.parse_body(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ModelConfig {
        ModelConfig {
            base_url: base_url.to_string(),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_endpoint_carries_model_and_key() {
        let transport =
            HttpTransport::new(&config("https://example.test/v1beta/"), "AIza-secret").unwrap();
        assert_eq!(
            transport.endpoint.as_str(),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent?key=AIza-secret"
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let transport = HttpTransport::new(&config("https://example.test/v1beta"), "AIza-secret").unwrap();
        let rendered = format!("{:?}", transport);
        assert!(rendered.contains("example.test"));
        assert!(!rendered.contains("AIza-secret"));
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let err = HttpTransport::new(&config("not a url"), "k").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
