//! HTTP client for a TestRail-style v2 API.
//!
//! Listing endpoints answer either with a bare JSON array or with a
//! paginated envelope such as `{"offset": 0, "limit": 250, "sections": [...]}`.
//! Both are accepted; anything else is a shape error.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::schema::UpstreamConfig;
use crate::error::{CoverageError, Result};
use crate::observability::redact_secrets;
use crate::types::{Section, TestCase};

use super::TestSource;

/// Longest slice of an error body kept in error messages.
const BODY_EXCERPT_LEN: usize = 300;

#[derive(Clone)]
enum Credentials {
    Anonymous,
    Basic { user: String, api_key: String },
    Bearer(String),
}

/// [`TestSource`] backed by the remote test-management service.
#[derive(Clone)]
pub struct HttpTestSource {
    client: reqwest::Client,
    base_url: String,
    project_id: i64,
    suite_id: Option<i64>,
    credentials: Credentials,
}

impl std::fmt::Debug for HttpTestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTestSource")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("suite_id", &self.suite_id)
            .finish_non_exhaustive()
    }
}

impl HttpTestSource {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| CoverageError::config("upstream.base_url is not set"))?;

        let credentials = match (&config.user, &config.api_key) {
            (Some(user), Some(key)) => Credentials::Basic {
                user: user.clone(),
                api_key: key.expose().to_string(),
            },
            (None, Some(key)) => Credentials::Bearer(key.expose().to_string()),
            _ => Credentials::Anonymous,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            project_id: config.project_id,
            suite_id: config.suite_id,
            credentials,
        })
    }

    fn sections_url(&self, offset: usize, limit: usize) -> String {
        let mut params = Vec::new();
        if let Some(suite) = self.suite_id {
            params.push(("suite_id", suite.to_string()));
        }
        params.push(("limit", limit.to_string()));
        params.push(("offset", offset.to_string()));
        with_query(
            &format!("{}/get_sections/{}", self.base_url, self.project_id),
            &params,
        )
    }

    fn cases_url(&self, section_id: i64, offset: usize, limit: usize) -> String {
        let mut params = Vec::new();
        if let Some(suite) = self.suite_id {
            params.push(("suite_id", suite.to_string()));
        }
        params.push(("section_id", section_id.to_string()));
        params.push(("limit", limit.to_string()));
        params.push(("offset", offset.to_string()));
        with_query(
            &format!("{}/get_cases/{}", self.base_url, self.project_id),
            &params,
        )
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        target: String,
        url: String,
        key: &str,
    ) -> Result<Vec<T>> {
        let request = match &self.credentials {
            Credentials::Anonymous => self.client.get(&url),
            Credentials::Basic { user, api_key } => {
                self.client.get(&url).basic_auth(user, Some(api_key))
            }
            Credentials::Bearer(token) => self.client.get(&url).bearer_auth(token),
        };

        let response = request.send().await.map_err(|e| {
            CoverageError::upstream(operation, target.clone(), redact_secrets(&e.to_string()))
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CoverageError::upstream(operation, target.clone(), redact_secrets(&e.to_string()))
        })?;

        if !status.is_success() {
            return Err(CoverageError::upstream(
                operation,
                target,
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    redact_secrets(excerpt(&body))
                ),
            ));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| CoverageError::Shape {
            operation,
            message: format!("invalid JSON: {e}"),
        })?;

        unwrap_collection(value, key, operation)?
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| CoverageError::Shape {
                    operation,
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

impl TestSource for HttpTestSource {
    fn sections_page(&self, offset: usize, limit: usize) -> BoxFuture<'_, Result<Vec<Section>>> {
        let url = self.sections_url(offset, limit);
        let target = format!("project {}", self.project_id);
        self.get_collection("get_sections", target, url, "sections")
            .boxed()
    }

    fn cases_page(
        &self,
        section_id: i64,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<TestCase>>> {
        let url = self.cases_url(section_id, offset, limit);
        let target = format!("section {section_id}");
        self.get_collection("get_cases", target, url, "cases").boxed()
    }
}

/// Recover the list of items from an upstream listing payload.
///
/// Accepts a bare array, or an object carrying the array under `key` or
/// under `data`.
pub fn unwrap_collection(value: Value, key: &str, operation: &'static str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for field in [key, "data"] {
                if let Some(Value::Array(items)) = map.remove(field) {
                    return Ok(items);
                }
            }
            Err(CoverageError::Shape {
                operation,
                message: format!("expected an array or an object with a `{key}` array"),
            })
        }
        other => Err(CoverageError::Shape {
            operation,
            message: format!("expected an array, got {}", json_kind(&other)),
        }),
    }
}

/// Append query parameters, tolerating base URLs that already carry a `?`
/// (TestRail's `index.php?/api/v2` form).
fn with_query(url: &str, params: &[(&str, String)]) -> String {
    let mut out = url.to_string();
    let mut sep = if url.contains('?') { '&' } else { '?' };
    for (name, value) in params {
        out.push(sep);
        out.push_str(name);
        out.push('=');
        out.push_str(value);
        sep = '&';
    }
    out
}

fn excerpt(body: &str) -> &str {
    if body.len() <= BODY_EXCERPT_LEN {
        return body;
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
