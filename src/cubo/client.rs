//! Cubo Casa cloud API client

use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::Method;
use serde_json::Value;
use url::Url;

use super::models::DeviceCommand;
use super::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use crate::error::ClientError;

/// Fixed per-attempt request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for a single backoff wait
pub const MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// Token and base URL, validated once at construction
#[derive(Debug, Clone)]
pub struct Credentials {
    token: String,
    base_url: String,
}

impl Credentials {
    pub fn new(token: &str, base_url: &str) -> Result<Self, ClientError> {
        if token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }
        if HeaderValue::from_str(token).is_err() {
            return Err(ClientError::InvalidToken);
        }

        let parsed = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(base_url.to_string(), e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ClientError::InvalidBaseUrl(
                base_url.to_string(),
                "scheme must be http or https".to_string(),
            ));
        }

        Ok(Self {
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Exponential backoff: wait `backoff_factor ^ attempt` seconds before retry `attempt + 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Capped at [`MAX_BACKOFF`]; a non-positive or NaN result means no wait
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let secs = self.backoff_factor.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Authenticated client for the three Cubo device endpoints.
///
/// Every call returns `Ok(None)` when all attempts failed at the transport
/// level. HTTP error statuses come back as `Ok(Some(response))`.
pub struct CuboClient<T = HttpTransport> {
    transport: T,
    credentials: Credentials,
    retry: RetryPolicy,
}

impl CuboClient<HttpTransport> {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_transport(HttpTransport::new(), credentials)
    }
}

impl<T: Transport> CuboClient<T> {
    pub fn with_transport(transport: T, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        self.credentials.base_url()
    }

    /// GET /api/device/
    pub async fn list_devices(&self) -> Result<Option<ApiResponse>, ClientError> {
        Ok(self
            .request_with_retry(Method::GET, "/api/device/", &[], None)
            .await)
    }

    /// GET /api/device/{id}/status/
    pub async fn get_device_status(
        &self,
        device_id: i64,
    ) -> Result<Option<ApiResponse>, ClientError> {
        let device_id = validate_device_id(device_id)?;
        let path = format!("/api/device/{}/status/", device_id);

        Ok(self.request_with_retry(Method::GET, &path, &[], None).await)
    }

    /// POST /api/device/{id}/ with `{"status": "open" | "close"}`
    pub async fn set_device_status(
        &self,
        device_id: i64,
        status: &str,
    ) -> Result<Option<ApiResponse>, ClientError> {
        let device_id = validate_device_id(device_id)?;
        let command: DeviceCommand = status.parse()?;
        let path = format!("/api/device/{}/", device_id);
        let body = serde_json::json!({ "status": command.as_str() });

        Ok(self
            .request_with_retry(
                Method::POST,
                &path,
                &[("Content-Type", "application/json")],
                Some(body),
            )
            .await)
    }

    async fn request_with_retry(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        json: Option<Value>,
    ) -> Option<ApiResponse> {
        let url = format!("{}{}", self.credentials.base_url, path);

        let mut merged = vec![("Bearer".to_string(), self.credentials.token.clone())];
        merged.extend(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let mut attempt = 0;
        loop {
            let request = ApiRequest {
                method: method.clone(),
                url: url.clone(),
                headers: merged.clone(),
                json: json.clone(),
                timeout: REQUEST_TIMEOUT,
            };

            match self.transport.execute(request).await {
                Ok(resp) => {
                    tracing::debug!("[CuboClient] {} {} -> {}", method, url, resp.status);
                    return Some(resp);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        "[CuboClient] {} {} failed (attempt {}): {}, retrying in {:?}",
                        method,
                        url,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "[CuboClient] {} {} failed after {} attempts: {}",
                        method,
                        url,
                        attempt + 1,
                        e
                    );
                    return None;
                }
            }
        }
    }
}

fn validate_device_id(device_id: i64) -> Result<i64, ClientError> {
    if device_id > 0 {
        Ok(device_id)
    } else {
        Err(ClientError::InvalidDeviceId(device_id))
    }
}
