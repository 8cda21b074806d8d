//! 持久化模块：通过 Supabase (PostgREST) 保存算法与分析记录。
//!
//! # Persistence
//!
//! Thin wrapper over three PostgREST tables:
//!
//! | Table | Written by | Read by |
//! |-------|-----------|---------|
//! | `users` | (managed by Supabase auth) | [`SupabaseStore::get_user`] |
//! | `algorithms` | [`SupabaseStore::save_algorithm`] | [`SupabaseStore::user_algorithms`] |
//! | `analyses` | [`SupabaseStore::save_analysis`] | - |
//!
//! Every request carries the `apikey` header plus bearer auth. Inserts ask for
//! `Prefer: return=representation` so the stored row (with its id) comes back.

pub mod records;

pub use records::{AlgorithmRecord, AnalysisRecord, NewAlgorithm, NewAnalysis, UserRecord};

use std::time::Duration;

use chrono::Utc;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::StoreConfig;
use crate::error::{Error, ErrorContext};
use crate::transport::{classify_status, TransportError};
use crate::Result;

const USERS: &str = "users";
const ALGORITHMS: &str = "algorithms";
const ANALYSES: &str = "analyses";

#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    rest_base: Url,
    api_key: String,
}

impl std::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("rest_base", &self.rest_base.as_str())
            .finish()
    }
}

impl SupabaseStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let raw = format!("{}/rest/v1/", config.url.trim_end_matches('/'));
        let rest_base = Url::parse(&raw).map_err(|e| {
            Error::configuration_with_context(
                "invalid Supabase URL",
                ErrorContext::new()
                    .with_field_path("supabase.url")
                    .with_details(e.to_string())
                    .with_source("supabase_store"),
            )
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
        Ok(Self {
            client,
            rest_base,
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.rest_base.join(table).map_err(|e| {
            Error::configuration_with_context(
                "invalid table path",
                ErrorContext::new()
                    .with_field_path(table)
                    .with_details(e.to_string())
                    .with_source("supabase_store"),
            )
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, table: &str, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e.without_url())))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(table, status = status.as_u16(), "store request failed");
            return Err(remote_error(status.as_u16(), &body));
        }
        response
            .json()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e.without_url())))
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, column: &str, value: &str) -> Result<Vec<T>> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair(column, &format!("eq.{}", value));
        debug!(table, column, "store select");
        self.send(table, self.request(Method::GET, url)).await
    }

    async fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &str, row: &B) -> Result<T> {
        let url = self.table_url(table)?;
        debug!(table, "store insert");
        let builder = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(row);
        let mut rows: Vec<T> = self.send(table, builder).await?;
        if rows.is_empty() {
            return Err(Error::Remote {
                status: 200,
                class: "empty_response".to_string(),
                message: format!("insert into {} returned no rows", table),
            });
        }
        Ok(rows.remove(0))
    }

    /// Look up one user; `None` when no row matches.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let mut rows: Vec<UserRecord> = self.select(USERS, "id", user_id).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    pub async fn save_algorithm(&self, algorithm: &NewAlgorithm) -> Result<AlgorithmRecord> {
        let now = Utc::now();
        let row = records::AlgorithmRow {
            algorithm,
            created_at: now,
            updated_at: now,
        };
        self.insert(ALGORITHMS, &row).await
    }

    pub async fn user_algorithms(&self, user_id: &str) -> Result<Vec<AlgorithmRecord>> {
        self.select(ALGORITHMS, "user_id", user_id).await
    }

    pub async fn save_analysis(&self, analysis: &NewAnalysis) -> Result<AnalysisRecord> {
        let row = records::AnalysisRow {
            analysis,
            created_at: Utc::now(),
        };
        self.insert(ANALYSES, &row).await
    }
}

/// PostgREST reports failures as `{"message": ..., "code": ..., ...}`.
fn remote_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().chars().take(200).collect());
    Error::Remote {
        status,
        class: classify_status(status, body).to_string(),
        message,
    }
}
