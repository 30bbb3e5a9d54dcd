//! HTTP transport seam
//!
//! The client never opens sockets itself. Every exchange with the server goes
//! through a [`Transport`], which takes one [`HttpRequest`] and returns the
//! status, content type and body of the reply. Plug in any HTTP stack (or an
//! in-memory fake in tests) by implementing the trait.
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use jmap_client::{HttpReply, HttpRequest, Transport};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl Transport for Offline {
//!     async fn send(&self, _request: HttpRequest) -> jmap_core::Result<HttpReply> {
//!         Err(jmap_core::Error::Transport("offline".into()))
//!     }
//! }
//! ```

use async_trait::async_trait;
use jmap_core::Result;
use std::sync::Arc;

/// HTTP method used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Session bootstrap and blob download
    Get,
    /// API calls and blob upload
    Post,
}

/// One outgoing HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    /// Value of the `Authorization` header, passed through unchanged
    pub authorization: String,
    /// Value of the `Content-Type` header, if there is a body
    pub content_type: Option<String>,
    /// Request body (empty for GET)
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>, authorization: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            authorization: authorization.into(),
            content_type: None,
            body: Vec::new(),
        }
    }

    /// Create a POST request carrying `body`
    pub fn post(
        url: impl Into<String>,
        authorization: impl Into<String>,
        content_type: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            authorization: authorization.into(),
            content_type: Some(content_type.into()),
            body,
        }
    }
}

/// Reply returned by a [`Transport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code
    pub status: u16,
    /// Value of the `Content-Type` header, if any
    pub content_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Create a reply
    pub fn new(status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the body is JSON, including `application/problem+json`.
    ///
    /// Media type parameters such as `charset` are ignored.
    pub fn is_json(&self) -> bool {
        let Some(content_type) = &self.content_type else {
            return false;
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence == "application/json" || essence == "application/problem+json"
    }
}

/// Sends HTTP requests on behalf of the client
///
/// Implementations report connection-level failures as
/// [`jmap_core::Error::Transport`]. Non-2xx replies are not failures at this
/// level: they are returned as an [`HttpReply`] and interpreted by the client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange
    async fn send(&self, request: HttpRequest) -> Result<HttpReply>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpReply> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpReply> {
        (**self).send(request).await
    }
}
