//! Common test utilities for jmap-client integration tests
//!
//! This module provides an in-memory mock server that implements
//! `Transport`, so the client can be exercised without a real JMAP server.

#![allow(dead_code)]

use async_trait::async_trait;
use jmap_client::{HttpMethod, HttpReply, HttpRequest, Transport};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SESSION_URL: &str = "https://jmap.example.com/.well-known/jmap";
pub const API_URL: &str = "https://jmap.example.com/api/";
pub const AUTHORIZATION: &str = "Bearer test-token";
pub const ACCOUNT_ID: &str = "A13824";

type Handler = dyn Fn(&HttpRequest) -> HttpReply + Send + Sync;

/// Mock JMAP server
///
/// Serves the session object on `GET SESSION_URL` and hands every other
/// request to the handler. All requests are recorded for verification.
#[derive(Clone)]
pub struct MockServer {
    session: Arc<Mutex<Value>>,
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockServer {
    /// Start a mock server that answers API calls with an empty response
    pub fn new() -> Self {
        Self::with_handler(|_| {
            json_reply(200, &json!({"methodResponses": [], "sessionState": "s1"}))
        })
    }

    /// Start a mock server with a custom handler for non-session requests
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpReply + Send + Sync + 'static,
    {
        Self {
            session: Arc::new(Mutex::new(session_json(16))),
            handler: Arc::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the session object served from now on
    pub async fn set_session(&self, session: Value) {
        *self.session.lock().await = session;
    }

    /// All requests received so far
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of session fetches received so far
    pub async fn session_fetches(&self) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.method == HttpMethod::Get && r.url == SESSION_URL)
            .count()
    }
}

#[async_trait]
impl Transport for MockServer {
    async fn send(&self, request: HttpRequest) -> jmap_core::Result<HttpReply> {
        self.requests.lock().await.push(request.clone());

        if request.method == HttpMethod::Get && request.url == SESSION_URL {
            let session = self.session.lock().await.clone();
            return Ok(json_reply(200, &session));
        }
        Ok((self.handler)(&request))
    }
}

/// Build a session object with the given call limit
pub fn session_json(max_calls_in_request: u64) -> Value {
    json!({
        "capabilities": {
            "urn:ietf:params:jmap:core": {
                "maxSizeUpload": 64,
                "maxConcurrentUpload": 4,
                "maxSizeRequest": 10000000,
                "maxConcurrentRequests": 4,
                "maxCallsInRequest": max_calls_in_request,
                "maxObjectsInGet": 1000,
                "maxObjectsInSet": 1000,
                "collationAlgorithms": ["i;ascii-numeric", "i;ascii-casemap"]
            },
            "urn:ietf:params:jmap:mail": {}
        },
        "accounts": {
            ACCOUNT_ID: {
                "name": "john@example.com",
                "isPersonal": true,
                "isReadOnly": false,
                "accountCapabilities": {
                    "urn:ietf:params:jmap:mail": {}
                }
            }
        },
        "primaryAccounts": {
            "urn:ietf:params:jmap:mail": ACCOUNT_ID
        },
        "username": "john@example.com",
        "apiUrl": API_URL,
        "downloadUrl": "https://jmap.example.com/download/{accountId}/{blobId}/{name}?accept={type}",
        "uploadUrl": "https://jmap.example.com/upload/{accountId}/",
        "eventSourceUrl": "https://jmap.example.com/eventsource/",
        "state": "s1"
    })
}

/// JSON reply with the given status
pub fn json_reply(status: u16, body: &Value) -> HttpReply {
    HttpReply::new(
        status,
        Some("application/json".to_string()),
        body.to_string().into_bytes(),
    )
}

/// Body of a recorded request parsed as JSON
pub fn body_json(request: &HttpRequest) -> Value {
    serde_json::from_slice(&request.body).unwrap()
}
