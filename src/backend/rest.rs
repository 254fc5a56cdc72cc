//! HTTP `DataClient` for a PostgREST-style table API with object storage
//! and an auth endpoint.
//!
//! Thin wrapper over `reqwest`. URL, query, and header construction are
//! pure functions so they can be tested without a network.

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::Deserialize;

use super::{BackendError, Blob, DataClient, Filter, Query, Row, RowRange, Session};
use crate::config::BackendConfig;

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;

const REST_PATH: &str = "rest/v1";
const STORAGE_PATH: &str = "storage/v1/object";
const AUTH_USER_PATH: &str = "auth/v1/user";

// =============================================================================
// CLIENT
// =============================================================================

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestClient {
    /// Build a client from backend config.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the underlying HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    /// Send a request and return headers and body for 2xx responses.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<(HeaderMap, String), BackendError> {
        let response = self
            .authed(req)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if status == 401 {
            return Err(BackendError::Unauthenticated);
        }
        if !(200..300).contains(&status) {
            return Err(BackendError::Response { status, body: text });
        }
        Ok((headers, text))
    }
}

#[async_trait::async_trait]
impl DataClient for RestClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, BackendError> {
        let mut req = self
            .http
            .get(table_url(&self.base_url, table))
            .query(&select_params(query));
        if let Some(range) = query.range {
            req = req
                .header("Range-Unit", "items")
                .header("Range", range_header(range));
        }
        let (_, body) = self.send(req).await?;
        parse_rows(&body)
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError> {
        let mut params = vec![("select".to_string(), "id".to_string())];
        params.extend(filter_params(filters));
        let req = self
            .http
            .head(table_url(&self.base_url, table))
            .query(&params)
            .header("Prefer", "count=exact");
        let (headers, _) = self.send(req).await?;
        let raw = headers
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BackendError::Parse("missing Content-Range header".into()))?;
        parse_content_range_total(raw)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, BackendError> {
        let req = self
            .http
            .post(table_url(&self.base_url, table))
            .header("Prefer", "return=representation")
            .json(&rows);
        let (_, body) = self.send(req).await?;
        parse_rows(&body)
    }

    async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, BackendError> {
        let req = self
            .http
            .patch(table_url(&self.base_url, table))
            .query(&filter_params(filters))
            .header("Prefer", "return=representation")
            .json(&patch);
        let (_, body) = self.send(req).await?;
        parse_rows(&body)
    }

    async fn upsert(&self, table: &str, rows: Vec<Row>, on_conflict: &str) -> Result<Vec<Row>, BackendError> {
        let req = self
            .http
            .post(table_url(&self.base_url, table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows);
        let (_, body) = self.send(req).await?;
        parse_rows(&body)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), BackendError> {
        let req = self
            .http
            .delete(table_url(&self.base_url, table))
            .query(&filter_params(filters));
        self.send(req).await?;
        Ok(())
    }

    async fn upload(&self, bucket: &str, path: &str, blob: Blob) -> Result<String, BackendError> {
        let req = self
            .http
            .post(object_url(&self.base_url, bucket, path))
            .header("Content-Type", blob.content_type)
            .header("x-upsert", "false")
            .body(blob.bytes);
        self.send(req).await?;
        Ok(path.to_string())
    }

    async fn remove_object(&self, bucket: &str, path: &str) -> Result<(), BackendError> {
        let req = self
            .http
            .delete(format!("{}/{STORAGE_PATH}/{bucket}", self.base_url))
            .json(&serde_json::json!({ "prefixes": [path] }));
        self.send(req).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        public_object_url(&self.base_url, bucket, path)
    }

    async fn session(&self) -> Result<Session, BackendError> {
        if self.access_token.is_none() {
            return Err(BackendError::Unauthenticated);
        }
        let req = self
            .http
            .get(format!("{}/{AUTH_USER_PATH}", self.base_url));
        let (_, body) = self.send(req).await?;
        parse_session(&body)
    }
}

// =============================================================================
// URL + QUERY BUILDING
// =============================================================================

fn table_url(base: &str, table: &str) -> String {
    format!("{base}/{REST_PATH}/{table}")
}

fn object_url(base: &str, bucket: &str, path: &str) -> String {
    format!("{base}/{STORAGE_PATH}/{bucket}/{}", path.trim_start_matches('/'))
}

fn public_object_url(base: &str, bucket: &str, path: &str) -> String {
    format!("{base}/{STORAGE_PATH}/public/{bucket}/{}", path.trim_start_matches('/'))
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
        .collect()
}

fn select_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        params.push(("order".to_string(), format!("{}.{}", order.column, order.direction.as_str())));
    }
    params
}

fn range_header(range: RowRange) -> String {
    format!("{}-{}", range.from, range.to)
}

/// Parse the total from `Content-Range: 0-9/42` (or `*/0` when empty).
fn parse_content_range_total(raw: &str) -> Result<u64, BackendError> {
    raw.rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| BackendError::Parse(format!("unparseable Content-Range: {raw}")))
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_rows(body: &str) -> Result<Vec<Row>, BackendError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    app_metadata: AppMetadata,
}

#[derive(Deserialize, Default)]
struct AppMetadata {
    role: Option<String>,
}

fn parse_session(body: &str) -> Result<Session, BackendError> {
    let user: AuthUser = serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(Session { user_id: user.id, email: user.email, role: user.app_metadata.role })
}
