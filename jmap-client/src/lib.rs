//! JMAP client over a pluggable HTTP transport
//!
//! This crate drives the JMAP Core request cycle on top of `jmap-core`:
//! fetch the session object, send batched method calls to the API endpoint,
//! and move blobs through the upload and download endpoints.
//!
//! # Core Features
//!
//! - **Transport seam**: bring any HTTP stack by implementing [`Transport`]
//! - **Session cache**: fetched lazily, refreshed on demand
//! - **Limit checks**: `maxCallsInRequest` and `maxSizeUpload` are enforced
//!   before any I/O
//! - **Problem details**: non-2xx JSON replies surface as
//!   [`jmap_core::RequestError`]
//! - **Batch builder**: positional call-ids for result references
//! - **Observability**: `tracing` events and OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jmap_client::{Batch, Client, Transport};
//! use jmap_core::{MethodResponse, Registry};
//! use serde_json::{json, Map, Value};
//!
//! # async fn example(transport: impl Transport) -> jmap_core::Result<()> {
//! let mut client: Client<_, Map<String, Value>> =
//!     Client::new(transport, "https://jmap.example.com/.well-known/jmap", "Bearer secret");
//!
//! let mut mail = Registry::new();
//! mail.register_object("Mailbox/get");
//! client.enable(&mail);
//!
//! let mut batch = Batch::new();
//! batch.use_capability("urn:ietf:params:jmap:core");
//! batch.use_capability("urn:ietf:params:jmap:mail");
//! let mut args = Map::new();
//! args.insert("accountId".into(), json!("A1"));
//! batch.add("Mailbox/get", args);
//!
//! let response = client.send(batch.request()).await?;
//! for result in response.responses() {
//!     match result {
//!         MethodResponse::Ok(inv) => println!("{}: {:?}", inv.name(), inv.args()),
//!         MethodResponse::Error(err) => println!("call {} failed: {}", err.call_id, err),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
mod client_builder;
mod metrics;
mod transport;

pub use batch::Batch;
pub use client::{Client, ECHO_METHOD};
pub use client_builder::ClientBuilder;
pub use metrics::ClientMetrics;
pub use transport::{HttpMethod, HttpReply, HttpRequest, Transport};
