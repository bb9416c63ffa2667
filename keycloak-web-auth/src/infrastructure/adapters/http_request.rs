//! Typed request helper shared by the HTTP adapters.
//!
//! A request is described with a small builder and sent with [`HttpRequest::send`],
//! which decodes a 2xx body into `S` and makes a best-effort attempt at decoding
//! any other body into the error payload `E`.

use reqwest::{header::HeaderMap, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Form(Vec<(String, String)>),
    Json(Result<serde_json::Value, String>),
}

/// A single request against an upstream API
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    url: String,
    bearer: Option<String>,
    query: Vec<(String, String)>,
    body: RequestBody,
    operation: &'static str,
}

/// Decoded success response
#[derive(Debug, Clone)]
pub struct HttpResponse<S> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: S,
}

/// Failure of a request, parameterized by the upstream's error payload
#[derive(Error, Debug)]
pub enum RequestError<E> {
    /// The request never produced a response
    #[error("{operation}: request failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    /// Non-2xx answer. `body` is `None` when the payload did not match `E`.
    #[error("{operation}: HTTP {status}: {text}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: Option<E>,
        text: String,
    },
    /// A 2xx answer whose body could not be decoded
    #[error("{operation}: failed to decode response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
    /// The request body could not be serialized
    #[error("{operation}: failed to encode request: {message}")]
    Encode {
        operation: &'static str,
        message: String,
    },
}

impl<E> RequestError<E> {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&E> {
        match self {
            RequestError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            RequestError::Transport { operation, .. }
            | RequestError::Status { operation, .. }
            | RequestError::Decode { operation, .. }
            | RequestError::Encode { operation, .. } => *operation,
        }
    }

    /// Raw response text, or the transport message when there was no response
    pub fn raw_message(&self) -> &str {
        match self {
            RequestError::Transport { message, .. }
            | RequestError::Decode { message, .. }
            | RequestError::Encode { message, .. } => message.as_str(),
            RequestError::Status { text, status, .. } => {
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("")
                } else {
                    text.as_str()
                }
            }
        }
    }
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>, operation: &'static str) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            query: Vec::new(),
            body: RequestBody::Empty,
            operation,
        }
    }

    pub fn get(url: impl Into<String>, operation: &'static str) -> Self {
        Self::new(Method::GET, url, operation)
    }

    pub fn post(url: impl Into<String>, operation: &'static str) -> Self {
        Self::new(Method::POST, url, operation)
    }

    pub fn put(url: impl Into<String>, operation: &'static str) -> Self {
        Self::new(Method::PUT, url, operation)
    }

    pub fn delete(url: impl Into<String>, operation: &'static str) -> Self {
        Self::new(Method::DELETE, url, operation)
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Form-encoded body
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = RequestBody::Json(serde_json::to_value(body).map_err(|e| e.to_string()));
        self
    }

    /// Send and decode the success body into `S`
    pub async fn send<S, E>(
        self,
        client: &reqwest::Client,
    ) -> Result<HttpResponse<S>, RequestError<E>>
    where
        S: DeserializeOwned,
        E: DeserializeOwned,
    {
        let operation = self.operation;
        let (status, headers, text) = self.exchange(client).await?;

        let body = serde_json::from_str::<S>(&text).map_err(|e| RequestError::Decode {
            operation,
            message: e.to_string(),
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Send and ignore any success body
    pub async fn send_empty<E>(
        self,
        client: &reqwest::Client,
    ) -> Result<HttpResponse<()>, RequestError<E>>
    where
        E: DeserializeOwned,
    {
        let (status, headers, _) = self.exchange(client).await?;
        Ok(HttpResponse {
            status,
            headers,
            body: (),
        })
    }

    async fn exchange<E>(
        self,
        client: &reqwest::Client,
    ) -> Result<(StatusCode, HeaderMap, String), RequestError<E>>
    where
        E: DeserializeOwned,
    {
        let operation = self.operation;
        debug!(operation, method = %self.method, url = %self.url, "Sending upstream request");

        let mut builder = client.request(self.method, &self.url);
        if let Some(ref token) = self.bearer {
            builder = builder.bearer_auth(token);
        }
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        builder = match self.body {
            RequestBody::Empty => builder,
            RequestBody::Form(ref fields) => builder.form(fields),
            RequestBody::Json(Ok(ref value)) => builder.json(value),
            RequestBody::Json(Err(message)) => {
                return Err(RequestError::Encode { operation, message });
            }
        };

        let response = builder.send().await.map_err(|e| RequestError::Transport {
            operation,
            message: e.to_string(),
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(|e| RequestError::Transport {
            operation,
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            debug!(operation, %status, "Upstream answered with an error status");
            let body = serde_json::from_str::<E>(&text).ok();
            return Err(RequestError::Status {
                operation,
                status,
                body,
                text,
            });
        }

        Ok((status, headers, text))
    }
}
