//! HTTP client for task store requests.
//!
//! This module provides a low-level HTTP client wrapper for making requests
//! to the task store API, handling bearer authentication and classifying
//! responses into `StoreError` outcomes.

use super::error::StoreError;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Makes requests to the task store and tries to conform response data to
/// the requested type.
///
#[derive(Clone)]
pub struct Client {
    pub(crate) access_token: String,
    pub(crate) base_url: String,
    pub(crate) http_client: reqwest::Client,
}

impl Client {
    /// Returns a new instance for the given access token and base URL.
    ///
    pub fn new(access_token: &str, base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Client {
            access_token: access_token.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            http_client,
        })
    }

    /// Return the decoded body of a successful request.
    ///
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let response = self.call(Method::GET, path, None).await?;
        Self::decode(response).await
    }

    /// Send a JSON body and return the decoded response.
    ///
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, StoreError> {
        let response = self.call(Method::POST, path, Some(body)).await?;
        Self::decode(response).await
    }

    /// Return whether a GET succeeds, ignoring whatever body comes back.
    ///
    pub async fn get_status(&self, path: &str) -> Result<(), StoreError> {
        self.call(Method::GET, path, None).await.map(|_| ())
    }

    /// Make a request whose response body is ignored. A `404` means the
    /// entity is already gone and counts as success.
    ///
    pub async fn send_idempotent(&self, method: Method, path: &str) -> Result<(), StoreError> {
        match self.call(method, path, None).await {
            Ok(_) => Ok(()),
            Err(StoreError::Unavailable {
                status: Some(404), ..
            }) => {
                log::debug!("Store reported {} as already gone, treating as done", path);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            log::error!(
                "Failed to deserialize store response: {}. Response body: {}",
                e,
                String::from_utf8_lossy(&bytes)
            );
            StoreError::transport(format!("invalid response body: {}", e))
        })
    }

    /// Make request and return the response if its status is a success.
    ///
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, StoreError> {
        let request_url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, request_url);

        let mut request = self
            .http_client
            .request(method, &request_url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        Self::check(response).await
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let response_text = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("Unable to read response"));
        if status == StatusCode::UNAUTHORIZED {
            log::warn!("Store rejected the access token");
        } else {
            log::error!(
                "Store request failed with status {}: {}",
                status,
                response_text
            );
        }
        Err(StoreError::from_status(status.as_u16(), response_text))
    }
}
