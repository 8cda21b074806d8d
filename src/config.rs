//! Gateway configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional YAML file
//! named by `XENOVATE_CONFIG`, then environment variables. The model
//! credential is additionally looked up in the OS keyring (service
//! `xenovate`, entry `gemini`) before the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GOOGLE_API_KEY` / `GEMINI_API_KEY` | none (fallback mode) |
//! | `XENOVATE_MODEL` | `gemini-1.5-flash` |
//! | `XENOVATE_GEMINI_BASE_URL` | `https://generativelanguage.googleapis.com/v1beta` |
//! | `XENOVATE_HTTP_TIMEOUT_SECS` | `30` |
//! | `XENOVATE_PROXY_URL` | none |
//! | `HOST` / `PORT` | `0.0.0.0` / `8000` |
//! | `CORS_ORIGINS` | `*` |
//! | `SUPABASE_URL` / `SUPABASE_KEY` | none (no store) |

use keyring::Entry;
use serde::Deserialize;
use std::env;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::drivers::GenerationConfig;
use crate::error::{Error, ErrorContext};
use crate::Result;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Models the prompts have been exercised against.
pub const SUPPORTED_MODELS: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-flash-002",
    "gemini-1.5-pro",
    "gemini-pro",
];

const KEYRING_SERVICE: &str = "xenovate";
const KEYRING_ENTRY: &str = "gemini";

/// Everything the invoker needs to reach the model.
#[derive(Clone)]
pub struct ModelConfig {
    /// Presence decides between active and fallback mode.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub proxy_url: Option<String>,
    pub generation: GenerationConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy_url: None,
            generation: GenerationConfig::default(),
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_deref().map(redact))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("proxy_url", &self.proxy_url)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Supabase (PostgREST) connection settings.
#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// `["*"]` allows any origin.
    pub cors_origins: Vec<String>,
    pub model: ModelConfig,
    pub store: Option<StoreConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            model: ModelConfig::default(),
            store: None,
        }
    }
}

/// On-disk configuration. Every field is optional; environment wins.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
    pub model: ModelSection,
    pub supabase: SupabaseSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub name: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub proxy_url: Option<String>,
    pub generation: Option<GenerationConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SupabaseSection {
    pub url: Option<String>,
    pub key: Option<String>,
}

impl ConfigFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

impl GatewayConfig {
    /// Load from the process environment (plus optional YAML file and keyring).
    pub fn from_env() -> Result<Self> {
        let file = match env::var("XENOVATE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => ConfigFile::load(path.trim())?,
            _ => ConfigFile::default(),
        };
        let mut config = Self::resolve(file, |name| env::var(name).ok())?;
        if let Some(key) = keyring_api_key() {
            config.model.api_key = Some(key);
        }
        Ok(config)
    }

    /// Merge `file` with variables supplied by `lookup` and validate the result.
    pub fn resolve<F>(file: ConfigFile, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var("HOST")
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        validate_host(&host)?;

        let port = match var("PORT") {
            Some(raw) => parse_var::<u16>("PORT", &raw)?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };
        if port == 0 {
            return Err(invalid("PORT", "PORT must be a number between 1 and 65535", "0"));
        }

        let cors_origins = var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .or(file.cors_origins)
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let section = file.model;
        let api_key = var("GOOGLE_API_KEY")
            .or_else(|| var("GEMINI_API_KEY"))
            .or(section.api_key)
            .filter(|k| !k.trim().is_empty());
        let model = var("XENOVATE_MODEL")
            .or(section.name)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = var("XENOVATE_GEMINI_BASE_URL")
            .or(section.base_url)
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        validate_url("XENOVATE_GEMINI_BASE_URL", &base_url)?;
        let timeout_secs = match var("XENOVATE_HTTP_TIMEOUT_SECS") {
            Some(raw) => parse_var::<u64>("XENOVATE_HTTP_TIMEOUT_SECS", &raw)?,
            None => section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        let proxy_url = var("XENOVATE_PROXY_URL").or(section.proxy_url);

        if let Some(key) = &api_key {
            if !key.starts_with("AI") {
                warn!("model API key does not look like a Google API key (expected prefix \"AI\")");
            }
        }
        if !SUPPORTED_MODELS.contains(&model.as_str()) {
            warn!(model = %model, "model is not in the supported list; prompts may behave differently");
        }

        let store = match (
            var("SUPABASE_URL").or(file.supabase.url),
            var("SUPABASE_KEY").or(file.supabase.key),
        ) {
            (Some(url), Some(api_key)) => {
                validate_url("SUPABASE_URL", &url)?;
                Some(StoreConfig { url, api_key })
            }
            _ => None,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            model: ModelConfig {
                api_key,
                model,
                base_url,
                timeout: Duration::from_secs(timeout_secs.max(1)),
                proxy_url,
                generation: section.generation.unwrap_or_default(),
            },
            store,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn keyring_api_key() -> Option<String> {
    let entry = Entry::new(KEYRING_SERVICE, KEYRING_ENTRY).ok()?;
    entry.get_password().ok().filter(|k| !k.trim().is_empty())
}

fn validate_host(host: &str) -> Result<()> {
    if host == "localhost" || IpAddr::from_str(host).is_ok() {
        Ok(())
    } else {
        Err(invalid(
            "HOST",
            "HOST must be an IP address or localhost",
            host,
        ))
    }
}

fn validate_url(name: &str, raw: &str) -> Result<()> {
    Url::parse(raw)
        .map(|_| ())
        .map_err(|e| invalid(name, "invalid URL", &format!("{}: {}", raw, e)))
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| invalid(name, &format!("{} has an invalid value", name), raw))
}

fn invalid(name: &str, message: &str, details: &str) -> Error {
    Error::configuration_with_context(
        message,
        ErrorContext::new()
            .with_field_path(name)
            .with_details(details)
            .with_source("config"),
    )
}

/// First four characters of a secret, for logs.
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Result<GatewayConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::resolve(ConfigFile::default(), |k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.model.model, DEFAULT_MODEL);
        assert!(config.model.api_key.is_none());
        assert!(config.store.is_none());
        assert_eq!(config.model.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_env_values() {
        let config = resolve(&[
            ("GEMINI_API_KEY", "AIza-test"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("CORS_ORIGINS", "http://localhost:3000, https://xenovate.dev"),
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_KEY", "service-key"),
        ])
        .unwrap();
        assert_eq!(config.model.api_key.as_deref(), Some("AIza-test"));
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://xenovate.dev"]
        );
        assert_eq!(config.store.unwrap().url, "https://abc.supabase.co");
    }

    #[test]
    fn test_google_key_wins_over_gemini_key() {
        let config = resolve(&[("GOOGLE_API_KEY", "AIg"), ("GEMINI_API_KEY", "AIm")]).unwrap();
        assert_eq!(config.model.api_key.as_deref(), Some("AIg"));
    }

    #[test]
    fn test_blank_key_means_fallback() {
        let config = resolve(&[("GOOGLE_API_KEY", "   ")]).unwrap();
        assert!(config.model.api_key.is_none());
    }

    #[test]
    fn test_invalid_port() {
        for bad in ["0", "70000", "eighty"] {
            let err = resolve(&[("PORT", bad)]).unwrap_err();
            assert_eq!(
                err.context().unwrap().field_path.as_deref(),
                Some("PORT"),
                "port {}",
                bad
            );
        }
    }

    #[test]
    fn test_invalid_host() {
        let err = resolve(&[("HOST", "example.com")]).unwrap_err();
        assert!(err.to_string().contains("HOST"));
    }

    #[test]
    fn test_store_needs_both_values() {
        let config = resolve(&[("SUPABASE_URL", "https://abc.supabase.co")]).unwrap();
        assert!(config.store.is_none());
    }

    #[test]
    fn test_yaml_file_is_overridden_by_env() {
        let file = ConfigFile::from_yaml(
            r#"
port: 7000
cors_origins: ["http://localhost:3000"]
model:
  name: gemini-1.5-pro
  timeout_secs: 10
  generation:
    temperature: 0.2
    top_p: 0.9
    top_k: 20
    max_output_tokens: 1024
"#,
        )
        .unwrap();
        let config = GatewayConfig::resolve(file, |k| {
            (k == "PORT").then(|| "7100".to_string())
        })
        .unwrap();
        assert_eq!(config.port, 7100);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.model.model, "gemini-1.5-pro");
        assert_eq!(config.model.timeout, Duration::from_secs(10));
        assert_eq!(config.model.generation.top_k, 20);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = resolve(&[
            ("GOOGLE_API_KEY", "AIzaSyVerySecret"),
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_KEY", "service-role-secret"),
        ])
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("VerySecret"));
        assert!(!rendered.contains("role-secret"));
        assert!(rendered.contains("AIza..."));
    }
}
