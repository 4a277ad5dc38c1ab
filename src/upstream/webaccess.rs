use crate::error::{GatewayError, GatewayResult};
use crate::upstream::{Credentials, DataLogQuery, DataLogSource, IntervalType, TagSamples};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetDataLogRequest<'a> {
    start_time: String,
    interval_type: IntervalType,
    interval: u32,
    records: u32,
    tags: Vec<DataLogTag<'a>>,
}

impl<'a> GetDataLogRequest<'a> {
    fn from_query(query: &'a DataLogQuery) -> Self {
        Self {
            start_time: query.start_time_string(),
            interval_type: query.interval_type,
            interval: query.interval,
            records: query.records,
            tags: query
                .tags
                .iter()
                .map(|name| DataLogTag {
                    name,
                    data_type: query.reduction.code(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DataLogTag<'a> {
    name: &'a str,
    data_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetDataLogResponse {
    result: Option<DataLogResult>,
    #[serde(default)]
    data_log: Vec<TagDataLog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DataLogResult {
    ret: i64,
    #[serde(default)]
    total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TagDataLog {
    name: String,
    #[serde(default)]
    values: Vec<String>,
}

/// Data-log client for the WebAccess JSON web services.
pub struct WebAccessClient {
    client: reqwest::Client,
    root_url: String,
}

impl WebAccessClient {
    pub fn new(root_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        let mut root_url = root_url.into();
        if !root_url.ends_with('/') {
            root_url.push('/');
        }

        Ok(Self { client, root_url })
    }

    pub fn datalog_url(&self, project: &str, node: &str) -> String {
        format!("{}Json/GetDataLog/{}/{}", self.root_url, project, node)
    }
}

#[async_trait]
impl DataLogSource for WebAccessClient {
    async fn fetch(&self, credentials: &Credentials, query: &DataLogQuery) -> GatewayResult<Vec<TagSamples>> {
        let url = self.datalog_url(&query.project, &query.node);
        let body = GetDataLogRequest::from_query(query);
        debug!("POST {} starting {}", url, body.start_time);

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.user, Some(&credentials.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("Network error: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("WebAccess rejected credentials for user {}", credentials.user);
            return Err(GatewayError::AuthenticationFailed);
        }
        if !status.is_success() {
            return Err(GatewayError::UpstreamUnavailable(format!("HTTP error: {}", status)));
        }

        let payload: GetDataLogResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("Failed to parse response: {}", e)))?;

        into_tag_samples(payload)
    }
}

fn into_tag_samples(payload: GetDataLogResponse) -> GatewayResult<Vec<TagSamples>> {
    if let Some(result) = &payload.result {
        if result.ret != 0 {
            return Err(GatewayError::UpstreamUnavailable(format!(
                "GetDataLog returned Ret={} (Total={})",
                result.ret, result.total
            )));
        }
    }

    Ok(payload
        .data_log
        .into_iter()
        .map(|log| TagSamples::new(log.name, log.values))
        .collect())
}
