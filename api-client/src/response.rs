//! Responses from an [ApiClient](crate::ApiClient), with the request that produced them.

use http_body_util::BodyExt as _;
use hyperdriver::Body;

use crate::error::{BoxError, HttpResponseError};

/// Wrapper around an HTTP response that remembers the request URI, and
/// collects the body on demand.
#[derive(Debug)]
pub struct Response {
    uri: http::Uri,
    response: http::response::Parts,
    body: Body,
}

impl Response {
    /// Create a new `Response` for a request sent to `uri`.
    pub fn new(uri: http::Uri, response: http::Response<Body>) -> Self {
        let (response, body) = response.into_parts();

        Self {
            uri,
            response,
            body,
        }
    }

    /// The status code of the response.
    pub fn status(&self) -> http::StatusCode {
        self.response.status
    }

    /// The headers of the response.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.response.headers
    }

    /// The URI of the request that produced this response.
    pub fn uri(&self) -> &http::Uri {
        &self.uri
    }

    /// Collect the full response body.
    pub async fn bytes(self) -> Result<bytes::Bytes, BoxError> {
        let collected = self
            .body
            .collect()
            .await
            .map_err(|err| -> BoxError { err.into() })?;
        Ok(collected.to_bytes())
    }

    /// Collect the response body as UTF-8 text.
    pub async fn text(self) -> Result<String, BoxError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(Into::into)
    }

    /// Collect the body and deserialize it as JSON.
    pub async fn json<T>(self) -> Result<T, BoxError>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Convert the `Response` into an `HttpResponseError` instance.
    pub async fn into_error(self) -> HttpResponseError {
        HttpResponseError::from_response(self).await
    }

    /// Convert the `Response` into an `HttpResponseError` instance if the response status is not a success status.
    pub async fn error_for_status(self) -> Result<Self, HttpResponseError> {
        if self.status().is_success() {
            Ok(self)
        } else {
            Err(self.into_error().await)
        }
    }
}
