//! HTTP client for the Loki query API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lokiprobe_domain::{LokiConfig, QueryKind, QueryRequest};
use lokiprobe_ports::QueryPort;

pub const TENANT_HEADER: &str = "X-Scope-OrgID";
pub const QUERY_RANGE_PATH: &str = "/loki/api/v1/query_range";
pub const QUERY_PATH: &str = "/loki/api/v1/query";

#[derive(Debug, Clone)]
pub struct LokiClient {
    http: reqwest::Client,
    base_url: String,
    tenant: String,
}

impl LokiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tenant: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            tenant: tenant.into(),
        }
    }

    pub fn from_config(config: &LokiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build loki http client")?;
        Ok(Self::new(http, &config.url, &config.tenant))
    }
}

fn nanos(at: DateTime<Utc>) -> String {
    at.timestamp_nanos_opt().unwrap_or_default().to_string()
}

/// Endpoint path and query-string pairs for a request.
pub fn request_params(request: &QueryRequest) -> (&'static str, Vec<(&'static str, String)>) {
    match request.kind {
        QueryKind::Logs => (
            QUERY_RANGE_PATH,
            vec![
                ("query", request.logql()),
                ("start", nanos(request.start)),
                ("end", nanos(request.end)),
                ("limit", request.limit.to_string()),
                ("direction", "backward".to_string()),
            ],
        ),
        QueryKind::Count => (
            QUERY_PATH,
            vec![("query", request.logql()), ("time", nanos(request.end))],
        ),
    }
}

#[async_trait]
impl QueryPort for LokiClient {
    async fn send(&self, request: &QueryRequest) -> Result<u16> {
        let (path, params) = request_params(request);
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .header(TENANT_HEADER, &self.tenant)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status().as_u16();
        // Read the body so the server does the full amount of work.
        let body = response.bytes().await.map(|b| b.len()).unwrap_or(0);
        tracing::trace!("{} -> {status} ({body} bytes)", request.describe());
        Ok(status)
    }
}
