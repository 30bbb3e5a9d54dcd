//! JMAP client
//!
//! This module provides the main [`Client`] type. It fetches the session
//! object on first use, enforces the session's call limit, posts request
//! bodies to the API endpoint and decodes the responses with the registered
//! argument decoders.
//!
//! # Client Lifecycle
//!
//! 1. **Build**: create with [`Client::new`] or [`crate::ClientBuilder`]
//! 2. **Enable**: register argument decoders for the capabilities in use
//! 3. **Use**: send requests, upload and download blobs
//! 4. **Refresh**: call [`Client::update_session`] when the response's
//!    session state differs from the cached one
//!
//! # Thread Safety
//!
//! Every I/O method takes `&self`. The cached session sits behind a tokio
//! `RwLock`; readers never observe a partially populated session. Two tasks
//! racing on an empty cache may both fetch the session, and the last write
//! wins.

use crate::metrics::ClientMetrics;
use crate::transport::{HttpReply, HttpRequest, Transport};
use jmap_core::{
    BlobInfo, Error, Id, Invocation, MethodResponse, Registry, Request, RequestError, Response,
    Result, Session, CORE_CAPABILITY,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Method name of the core echo call
pub const ECHO_METHOD: &str = "Core/echo";

const JSON_CONTENT_TYPE: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// JMAP client over a pluggable [`Transport`]
///
/// `A` is the argument type produced by the client's registry when decoding
/// responses.
pub struct Client<T, A> {
    transport: T,
    session_endpoint: String,
    authorization: String,
    session: RwLock<Option<Arc<Session>>>,
    registry: Registry<A>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl<T: Transport, A> Client<T, A> {
    /// Create a client
    ///
    /// `authorization` is sent verbatim as the `Authorization` header, for
    /// example `"Bearer <token>"`.
    pub fn new(
        transport: T,
        session_endpoint: impl Into<String>,
        authorization: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            session_endpoint: session_endpoint.into(),
            authorization: authorization.into(),
            session: RwLock::new(None),
            registry: Registry::new(),
            metrics: None,
        }
    }

    pub(crate) fn with_metrics(mut self, metrics: Option<Arc<ClientMetrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Merge the decoders of `registry` into the client's registry
    pub fn enable(&mut self, registry: &Registry<A>) {
        self.registry.merge(registry);
        tracing::debug!(methods = self.registry.len(), "Registry updated");
    }

    /// Decoders used by [`Client::send`]
    pub fn registry(&self) -> &Registry<A> {
        &self.registry
    }

    /// URL the session object is fetched from
    pub fn session_endpoint(&self) -> &str {
        &self.session_endpoint
    }

    /// Cached session, without fetching
    pub async fn cached_session(&self) -> Option<Arc<Session>> {
        self.session.read().await.clone()
    }

    /// Fetch the session object and replace the cached one
    #[tracing::instrument(skip(self), fields(endpoint = %self.session_endpoint))]
    pub async fn update_session(&self) -> Result<Arc<Session>> {
        if self.session_endpoint.is_empty() {
            return Err(Error::SessionEndpointMissing);
        }

        let request = HttpRequest::get(&self.session_endpoint, &self.authorization);
        let reply = self.exchange("session", request).await?;
        let session: Session = serde_json::from_slice(&reply.body).map_err(|e| {
            self.record_error("serialization");
            Error::from(e)
        })?;
        let session = Arc::new(session);

        *self.session.write().await = Some(Arc::clone(&session));
        if let Some(ref m) = self.metrics {
            m.record_session_refresh();
        }
        tracing::info!(
            state = %session.state,
            username = %session.username,
            accounts = session.accounts.len(),
            "Session updated"
        );

        Ok(session)
    }

    /// Cached session, fetched on first use
    pub async fn session(&self) -> Result<Arc<Session>> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(Arc::clone(session));
        }

        let fetched = self.update_session().await?;
        let guard = self.session.read().await;
        Ok(guard.as_ref().map(Arc::clone).unwrap_or(fetched))
    }

    /// Send a request, decoding results with the client's registry
    pub async fn send(&self, request: &Request<A>) -> Result<Response<A>>
    where
        A: Serialize,
    {
        self.send_with(request, &self.registry).await
    }

    /// Send a request, decoding results with `registry`
    ///
    /// Fails with a `limit` request error before any I/O when the request
    /// holds more calls than the session's `maxCallsInRequest`.
    #[tracing::instrument(skip(self, request, registry), fields(calls = request.calls().len()))]
    pub async fn send_with<B: Serialize>(
        &self,
        request: &Request<B>,
        registry: &Registry<B>,
    ) -> Result<Response<B>> {
        if self.session_endpoint.is_empty() {
            return Err(Error::SessionEndpointMissing);
        }
        let session = self.session().await?;

        let calls = request.calls().len() as u64;
        let limit = session.core.max_calls_in_request.0;
        if calls > limit {
            tracing::warn!(calls, limit, "Request exceeds maxCallsInRequest");
            self.record_error("limit");
            return Err(RequestError::limit("maxCallsInRequest").into());
        }

        let body = request.to_json()?;
        tracing::debug!(bytes = body.len(), url = %session.api_url, "Sending request");
        let request = HttpRequest::post(
            &session.api_url,
            &self.authorization,
            JSON_CONTENT_TYPE,
            body.into_bytes(),
        );
        let reply = self.exchange("api", request).await?;
        if let Some(ref m) = self.metrics {
            m.record_calls(calls);
        }

        let text = std::str::from_utf8(&reply.body).map_err(|e| {
            self.record_error("serialization");
            Error::Serialization(e.to_string())
        })?;
        let response = Response::from_json(text, registry).inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to decode response");
            self.record_error("serialization");
        })?;

        tracing::debug!(
            responses = response.responses().len(),
            session_state = response.session_state(),
            "Response received"
        );
        if response.session_state() != session.state {
            tracing::info!(
                cached = %session.state,
                current = response.session_state(),
                "Session state changed"
            );
        }

        Ok(response)
    }

    /// Send an empty `Core/echo` call and check it succeeds
    pub async fn echo(&self) -> Result<()> {
        let mut registry: Registry<Map<String, Value>> = Registry::new();
        registry.register_object(ECHO_METHOD);

        let request = Request::new(vec![CORE_CAPABILITY.to_string()])
            .with_call(Invocation::new(ECHO_METHOD, "echo0", Map::new()));
        let response = self.send_with(&request, &registry).await?;

        match response.into_responses().into_iter().next() {
            Some(MethodResponse::Ok(_)) => Ok(()),
            Some(MethodResponse::Error(err)) => Err(err.into()),
            None => Err(Error::Serialization(
                "empty methodResponses for Core/echo".to_string(),
            )),
        }
    }

    /// Upload a blob to an account
    ///
    /// Fails with a `limit` request error before any I/O when `data` is larger
    /// than the session's `maxSizeUpload`.
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn upload(
        &self,
        account_id: &Id,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<BlobInfo> {
        let session = self.session().await?;

        let limit = session.core.max_size_upload.0;
        if data.len() as u64 > limit {
            tracing::warn!(bytes = data.len(), limit, "Upload exceeds maxSizeUpload");
            self.record_error("limit");
            return Err(RequestError::limit("maxSizeUpload").into());
        }

        let url = session.upload_url(account_id);
        let request = HttpRequest::post(url, &self.authorization, content_type, data);
        let reply = self.exchange("upload", request).await?;

        let info: BlobInfo = serde_json::from_slice(&reply.body).map_err(|e| {
            self.record_error("serialization");
            Error::from(e)
        })?;
        tracing::debug!(blob_id = %info.blob_id, size = info.size.0, "Blob uploaded");
        Ok(info)
    }

    /// Download a blob as `application/octet-stream`, named after its id
    pub async fn download(&self, account_id: &Id, blob_id: &Id) -> Result<Vec<u8>> {
        self.download_as(account_id, blob_id, blob_id.as_str(), OCTET_STREAM)
            .await
    }

    /// Download a blob, asking the server to label it with `name` and
    /// `content_type`
    #[tracing::instrument(skip(self))]
    pub async fn download_as(
        &self,
        account_id: &Id,
        blob_id: &Id,
        name: &str,
        content_type: &str,
    ) -> Result<Vec<u8>> {
        let session = self.session().await?;
        let url = session.download_url(account_id, blob_id, name, content_type);
        let reply = self
            .exchange("download", HttpRequest::get(url, &self.authorization))
            .await?;
        tracing::debug!(bytes = reply.body.len(), "Blob downloaded");
        Ok(reply.body)
    }

    /// Run one exchange, turning non-2xx replies into errors
    async fn exchange(&self, kind: &str, request: HttpRequest) -> Result<HttpReply> {
        let start = Instant::now();
        let result = self.transport.send(request).await;
        let elapsed = start.elapsed().as_secs_f64();

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(kind, error = %e, "Transport failed");
                self.record_request(kind, "error", elapsed);
                self.record_error("transport");
                return Err(e);
            }
        };

        if reply.is_success() {
            self.record_request(kind, "success", elapsed);
            return Ok(reply);
        }

        self.record_request(kind, "error", elapsed);
        let err = reply_error(&reply);
        tracing::warn!(kind, status = reply.status, error = %err, "Server rejected request");
        self.record_error(match err {
            Error::Request(_) => "request",
            _ => "http",
        });
        Err(err)
    }

    fn record_request(&self, kind: &str, status: &str, duration_secs: f64) {
        if let Some(ref m) = self.metrics {
            m.record_request(kind, status, duration_secs);
        }
    }

    fn record_error(&self, error_type: &str) {
        if let Some(ref m) = self.metrics {
            m.record_error(error_type);
        }
    }
}

/// Interpret a non-2xx reply
///
/// A JSON body is decoded as RFC 7807 problem details. Anything else, or a
/// JSON body that is not a problem object, becomes a plain HTTP status error.
fn reply_error(reply: &HttpReply) -> Error {
    if reply.is_json() {
        if let Ok(problem) = serde_json::from_slice::<RequestError>(&reply.body) {
            return Error::Request(problem);
        }
    }
    Error::Http {
        status: reply.status,
    }
}
