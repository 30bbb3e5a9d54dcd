//! Core JMAP (RFC 8620) types and wire codec
//!
//! This crate provides the foundational pieces for speaking JMAP Core:
//!
//! - **Types**: constrained base types (`Int`, `UnsignedInt`, `Id`, `Date`, `UtcDate`)
//! - **Codec**: the positional `[name, args, callId]` invocation format and the
//!   request/response bodies built from it
//! - **Registry**: pluggable per-method argument decoders
//! - **Error handling**: library errors, request-level problem details and
//!   per-call method errors
//! - **Pointer**: RFC 6901 JSON Pointer resolution used by result references
//! - **Session**: the session resource and its core capability limits
//! - **Observability**: `tracing` subscriber and OpenTelemetry export setup
//!
//! # Architecture
//!
//! The crate is transport-agnostic: it turns values into request bodies and
//! response bodies back into values, and never performs I/O. The
//! `jmap-client` crate builds an HTTP-style client on top of it.
//!
//! # Example
//!
//! ```rust
//! use jmap_core::{ErrorCode, Invocation, MethodResponse, Registry, Request, Response};
//! use serde_json::{json, Value};
//!
//! let request = Request::new(vec!["urn:ietf:params:jmap:core".into()])
//!     .with_call(Invocation::new("Core/echo", "c0", json!({"hello": true})));
//! let body = request.to_json().unwrap();
//!
//! let mut registry: Registry<Value> = Registry::new();
//! registry.register("Core/echo", |args: &serde_json::value::RawValue| -> jmap_core::Result<Value> {
//!     Ok(serde_json::from_str(args.get())?)
//! });
//!
//! let reply = r#"{"methodResponses":[["Core/echo",{"hello":true},"c0"],["error",{"type":"serverFail"},"c1"]],"sessionState":"s1"}"#;
//! let response = Response::from_json(reply, &registry).unwrap();
//! assert!(matches!(&response.responses()[0], MethodResponse::Ok(inv) if inv.args()["hello"] == true));
//! assert_eq!(response.responses()[1].as_error().unwrap().error_type, ErrorCode::ServerFail);
//! # let _ = body;
//! ```

pub mod blob;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod error_code;
pub mod observability;
pub mod pointer;
pub mod registry;
pub mod session;
pub mod types;

// Re-export the most commonly used types for convenience
pub use blob::BlobInfo;
pub use envelope::{CreatedIds, Invocation, MethodResponse, Request, Response};
pub use error::{Error, MethodError, ProblemType, RequestError, Result, PROBLEM_PREFIX};
pub use error_code::ErrorCode;
pub use observability::{init_observability, ObservabilityConfig};
pub use pointer::{get_json, JsonPointer, Pointable, ResultReference};
pub use registry::{ArgsDecoder, Registry};
pub use session::{Account, CollationAlgorithm, CoreCapability, Session, CORE_CAPABILITY};
pub use types::{Date, Id, Int, UnsignedInt, UtcDate, MAX_SAFE_INTEGER};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
