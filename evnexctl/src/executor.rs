//! Resilient request executor
//!
//! Every call to the EVNEX API goes through [`Executor::execute`]. One
//! logical request may take several attempts; each attempt attaches the
//! current access token, and failures are classified into [`EvnexError`]
//! variants before the [`RetryPolicy`] decides whether to go again.

use crate::auth::CredentialStore;
use crate::retry::RetryPolicy;
use evnex_core::{EvnexError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Normalize a base URL by removing trailing slashes.
pub(crate) fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Short endpoint name used in errors and logs, e.g. `apps/user`
fn endpoint_name(path: &str) -> String {
    let path = path.trim_start_matches('/');
    path.strip_prefix("v2/")
        .or_else(|| path.strip_prefix("v3/"))
        .unwrap_or(path)
        .to_string()
}

/// One logical API operation
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Overrides the client-wide timeout
    pub timeout: Option<Duration>,
    /// Time-sensitive commands set this to false so a timeout, local or a
    /// 504/408 reply, surfaces at once
    pub retry_on_timeout: bool,
    /// When false the response body is ignored and `Value::Null` returned
    pub expect_body: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
            retry_on_timeout: true,
            expect_body: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn no_timeout_retry(mut self) -> Self {
        self.retry_on_timeout = false;
        self
    }

    pub fn discard_body(mut self) -> Self {
        self.expect_body = false;
        self
    }

    pub fn endpoint(&self) -> String {
        endpoint_name(&self.path)
    }
}

/// Sends [`ApiRequest`]s with authentication, classification and retries
#[derive(Debug, Clone)]
pub struct Executor {
    http: Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
    retry: RetryPolicy,
}

impl Executor {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<CredentialStore>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("evnexctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EvnexError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: normalize_url(base_url),
            credentials,
            retry,
        })
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run a request to completion under the retry policy
    pub async fn execute(&self, request: &ApiRequest) -> Result<Value> {
        self.execute_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), stopping with `Cancelled` as soon as
    /// `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let endpoint = request.endpoint();
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(EvnexError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(EvnexError::Cancelled),
                outcome = self.attempt(request, &endpoint, attempt) => outcome,
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if error.is_gateway_timeout() && !request.retry_on_timeout {
                debug!(endpoint = %endpoint, "Timeout on time-sensitive request, not retrying");
                return Err(error);
            }
            if !self.retry.should_retry(&error, attempt) {
                return Err(error);
            }

            let delay = self.retry.backoff(attempt);
            warn!(
                endpoint = %endpoint,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Request failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(EvnexError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    async fn attempt(&self, request: &ApiRequest, endpoint: &str, attempt: u32) -> Result<Value> {
        let token = self.credentials.access_token().await?;
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, url = %url, attempt = attempt + 1, "Sending request");

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, token);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, endpoint))?;

        Self::handle_response(response, endpoint, request.expect_body).await
    }

    /// Classify a response into a JSON value or an error
    async fn handle_response(response: Response, endpoint: &str, expect_body: bool) -> Result<Value> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(EvnexError::NotAuthorized {
                endpoint: endpoint.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, endpoint))?;

        if !status.is_success() {
            return Err(EvnexError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        if !expect_body {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| EvnexError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
            body: text,
        })
    }
}

fn transport_error(error: reqwest::Error, endpoint: &str) -> EvnexError {
    if error.is_timeout() {
        EvnexError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        EvnexError::Transport {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("https://client-api.evnex.io"),
            "https://client-api.evnex.io"
        );
        assert_eq!(
            normalize_url("https://client-api.evnex.io///"),
            "https://client-api.evnex.io"
        );
    }

    #[test]
    fn test_endpoint_name() {
        assert_eq!(endpoint_name("/v2/apps/user"), "apps/user");
        assert_eq!(endpoint_name("/v3/charge-points/cp-1"), "charge-points/cp-1");
        assert_eq!(endpoint_name("/other"), "other");
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::post("/v2/apps/organisations/o/charge-points/c/commands/remote-stop-transaction")
            .json(serde_json::json!({"connectorId": "1"}))
            .timeout(Duration::from_secs(10))
            .no_timeout_retry();
        assert_eq!(request.method, Method::POST);
        assert!(!request.retry_on_timeout);
        assert!(request.expect_body);
        assert_eq!(request.timeout, Some(Duration::from_secs(10)));

        let request = ApiRequest::get("/v3/organisations/o/summary/insights")
            .query("days", 7)
            .query("tz-offset", "+12:00");
        assert_eq!(request.query.len(), 2);
        assert_eq!(request.query[1].0, "tz-offset");
    }
}
