//! JMAP - JSON Meta Application Protocol (RFC 8620) core
//!
//! This is the main convenience crate that re-exports all jmap sub-crates.
//! Use this crate if you want a single dependency that provides both the
//! wire codec and the client.
//!
//! # Architecture
//!
//! jmap is organized into modular crates:
//!
//! - **jmap-core**: base types, invocation codec, envelopes, error taxonomy,
//!   JSON pointers, session model, observability
//! - **jmap-client**: session bootstrap, batched API calls and blob transfer
//!   over a pluggable HTTP transport
//!
//! # Quick Start - Codec
//!
//! ```rust
//! use jmap::{Invocation, Registry, Request};
//! use serde_json::{json, Value};
//!
//! let request = Request::new(vec!["urn:ietf:params:jmap:core".into()])
//!     .with_call(Invocation::new("Core/echo", "c0", json!({"ping": 1})));
//! let body = request.to_json().unwrap();
//!
//! let mut registry: Registry<Value> = Registry::new();
//! registry.register_typed("Core/echo", |v: Value| v);
//! let decoded = Request::from_json(&body, &registry).unwrap();
//! assert_eq!(decoded, request);
//! ```
//!
//! # Quick Start - Client
//!
//! ```rust,no_run
//! use jmap::{ClientBuilder, Transport};
//! use serde_json::{Map, Value};
//!
//! # async fn example(transport: impl Transport) -> jmap::Result<()> {
//! let client = ClientBuilder::<_, Map<String, Value>>::new(transport)
//!     .session_endpoint("https://jmap.example.com/.well-known/jmap")
//!     .authorization("Bearer secret")
//!     .connect()
//!     .await?;
//! client.echo().await?;
//! # Ok(())
//! # }
//! ```

// Re-export all public APIs from sub-crates
pub use jmap_client as client;
pub use jmap_core as core;

// Convenience re-exports of the most commonly used types
pub use jmap_client::{Batch, Client, ClientBuilder, HttpReply, HttpRequest, Transport};
pub use jmap_core::{
    Error, ErrorCode, Id, Invocation, MethodError, MethodResponse, Registry, Request,
    RequestError, Response, Result, Session,
};
