use std::time::Duration;

use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Result, UmiError};

/// Thin wrapper over `reqwest` shared by all endpoint clients.
///
/// Every call is a single request: no retries and no timeout unless the
/// configuration sets one. Non-2xx statuses become
/// [`UmiError::RequestFailed`] before the body is looked at.
#[derive(Clone, Debug)]
pub(crate) struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.parsed_base_url()?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| UmiError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The per-call override if present, otherwise `<base><path>`.
    pub fn endpoint(&self, path: &str, url_override: Option<&str>) -> String {
        match url_override {
            Some(url) => url.to_string(),
            None => format!("{}{path}", self.base_url),
        }
    }

    pub async fn post_json<B, R>(&self, operation: &'static str, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(operation, url, "Sending JSON request");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;
        decode_response(operation, response).await
    }

    pub async fn post_multipart<R>(
        &self,
        operation: &'static str,
        url: &str,
        form: multipart::Form,
    ) -> Result<R>
    where
        R: DeserializeOwned,
    {
        debug!(operation, url, "Sending multipart request");
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;
        decode_response(operation, response).await
    }

    pub async fn get_json<R>(&self, operation: &'static str, url: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        debug!(operation, url, "Sending GET request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;
        decode_response(operation, response).await
    }
}

fn transport_error(operation: &'static str, e: reqwest::Error) -> UmiError {
    if e.is_timeout() {
        UmiError::request_failed(operation, "Request timeout")
    } else if e.is_connect() {
        UmiError::request_failed(operation, format!("Connection failed: {e}"))
    } else {
        UmiError::request_failed(operation, e.to_string())
    }
}

async fn decode_response<R: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<R> {
    let status = response.status();
    debug!(operation, %status, "Received response");

    if !status.is_success() {
        return Err(UmiError::request_failed(operation, status.to_string()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(operation, e))?;

    serde_json::from_slice(&body).map_err(|e| UmiError::Decode {
        operation,
        message: e.to_string(),
    })
}
