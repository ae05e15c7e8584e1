//! Backend HTTP transport.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

/// Errors from talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered 404.
    #[error("resource not found")]
    NotFound,

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status other than 404.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Check if the backend reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// JSON client for one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);

        debug!(%method, %url, "backend request");

        self.http.request(method, url)
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status or an
    /// unexpected body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        decode(send(self.request(Method::GET, path)).await?)
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status or an
    /// unexpected body.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        decode(send(self.request(Method::POST, path).json(body)).await?)
    }

    /// `PUT` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status or an
    /// unexpected body.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        decode(send(self.request(Method::PUT, path).json(body)).await?)
    }

    /// `DELETE` a resource, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or non-2xx status.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        send(self.request(Method::DELETE, path)).await.map(drop)
    }
}

async fn send(request: RequestBuilder) -> Result<String, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    check_status(status, body)
}

fn check_status(status: StatusCode, body: String) -> Result<String, ApiError> {
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }

    if !status.is_success() {
        return Err(ApiError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

fn decode<T: DeserializeOwned>(body: String) -> Result<T, ApiError> {
    Ok(serde_json::from_str(&body)?)
}
