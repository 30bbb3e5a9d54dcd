//! Request and response envelopes
//!
//! A JMAP request carries an ordered list of method calls together with the
//! capabilities it relies on. The response carries one result per call, in
//! the same order, plus the current session state token.
//!
//! # Message Types
//!
//! 1. **Invocation**: one method call or result (name, arguments, call-id)
//! 2. **Request**: the batch sent by the client
//! 3. **Response**: the batch returned by the server
//! 4. **MethodResponse**: a single result, either the method's own arguments
//!    or a [`MethodError`] reported under the reserved name `"error"`
//!
//! The argument type `A` is chosen by the caller. On decode it is produced by
//! the decoders of a [`Registry`]; on encode it only needs `Serialize`.
//!
//! # Examples
//!
//! ```rust
//! use jmap_core::{Invocation, Registry, Request};
//! use serde_json::{json, Map, Value};
//!
//! let mut args = Map::new();
//! args.insert("hello".into(), json!(true));
//!
//! let request = Request::new(vec!["urn:ietf:params:jmap:core".into()])
//!     .with_call(Invocation::new("Core/echo", "c0", args));
//! let json = request.to_json().unwrap();
//! assert_eq!(
//!     json,
//!     r#"{"using":["urn:ietf:params:jmap:core"],"methodCalls":[["Core/echo",{"hello":true},"c0"]]}"#
//! );
//!
//! let mut registry: Registry<Map<String, Value>> = Registry::new();
//! registry.register_object("Core/echo");
//! let decoded = Request::from_json(&json, &registry).unwrap();
//! assert_eq!(decoded.calls()[0].call_id(), "c0");
//! ```

use crate::codec;
use crate::error::{MethodError, Result};
use crate::registry::Registry;
use crate::types::Id;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mapping of client-chosen creation ids to server-assigned ids.
pub type CreatedIds = BTreeMap<Id, Id>;

/// One method call or method result
///
/// Immutable once constructed: the name, call-id and arguments are only
/// readable through accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation<A> {
    name: String,
    call_id: String,
    args: A,
}

impl<A> Invocation<A> {
    /// Create an invocation
    pub fn new(name: impl Into<String>, call_id: impl Into<String>, args: A) -> Self {
        Self {
            name: name.into(),
            call_id: call_id.into(),
            args,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call-id echoed by the server
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Method arguments
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Take the arguments
    pub fn into_args(self) -> A {
        self.args
    }
}

impl<A: Serialize> Invocation<A> {
    /// Encode as a `[name, args, callId]` triplet.
    pub fn to_json(&self) -> Result<String> {
        let args = serde_json::value::to_raw_value(&self.args)?;
        codec::encode_invocation(&self.name, &args, &self.call_id)
    }
}

/// Batch of method calls sent by the client
#[derive(Debug, Clone, PartialEq)]
pub struct Request<A> {
    using: Vec<String>,
    calls: Vec<Invocation<A>>,
    created_ids: Option<CreatedIds>,
}

impl<A> Request<A> {
    /// Create a request using the given capabilities and no calls.
    pub fn new(using: Vec<String>) -> Self {
        Self {
            using,
            calls: Vec::new(),
            created_ids: None,
        }
    }

    /// Create a request from all of its parts.
    pub fn from_parts(
        using: Vec<String>,
        calls: Vec<Invocation<A>>,
        created_ids: Option<CreatedIds>,
    ) -> Self {
        Self {
            using,
            calls,
            created_ids,
        }
    }

    /// Append a call.
    pub fn with_call(mut self, call: Invocation<A>) -> Self {
        self.calls.push(call);
        self
    }

    /// Set the creation id mapping sent to the server.
    pub fn with_created_ids(mut self, created_ids: CreatedIds) -> Self {
        self.created_ids = Some(created_ids);
        self
    }

    /// Append a call in place.
    pub fn push_call(&mut self, call: Invocation<A>) {
        self.calls.push(call);
    }

    /// Add a capability to `using` unless already listed.
    pub fn use_capability(&mut self, capability: impl Into<String>) {
        let capability = capability.into();
        if !self.using.contains(&capability) {
            self.using.push(capability);
        }
    }

    /// Capabilities the client wishes to use
    pub fn using(&self) -> &[String] {
        &self.using
    }

    /// Method calls in order
    pub fn calls(&self) -> &[Invocation<A>] {
        &self.calls
    }

    /// Creation id mapping, if present
    pub fn created_ids(&self) -> Option<&CreatedIds> {
        self.created_ids.as_ref()
    }

    /// Take the method calls
    pub fn into_calls(self) -> Vec<Invocation<A>> {
        self.calls
    }

    /// Decode a request body, decoding every call's arguments with `registry`.
    pub fn from_json(data: &str, registry: &Registry<A>) -> Result<Self> {
        codec::decode_request(data, registry)
    }
}

impl<A: Serialize> Request<A> {
    /// Encode the request body.
    pub fn to_json(&self) -> Result<String> {
        codec::encode_request(self)
    }
}

/// One entry of `methodResponses`
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse<A> {
    /// The method succeeded and returned its arguments.
    Ok(Invocation<A>),
    /// The method failed.
    Error(MethodError),
}

impl<A> MethodResponse<A> {
    /// Method name on the wire (`"error"` for failures)
    pub fn name(&self) -> &str {
        match self {
            MethodResponse::Ok(invocation) => invocation.name(),
            MethodResponse::Error(_) => MethodError::METHOD_NAME,
        }
    }

    /// Call-id of the call this result belongs to
    pub fn call_id(&self) -> &str {
        match self {
            MethodResponse::Ok(invocation) => invocation.call_id(),
            MethodResponse::Error(err) => &err.call_id,
        }
    }

    /// Whether the call failed
    pub fn is_error(&self) -> bool {
        matches!(self, MethodResponse::Error(_))
    }

    /// The method error, if the call failed
    pub fn as_error(&self) -> Option<&MethodError> {
        match self {
            MethodResponse::Error(err) => Some(err),
            MethodResponse::Ok(_) => None,
        }
    }

    /// Convert into a `Result`, turning method errors into `Err`.
    pub fn into_result(self) -> std::result::Result<Invocation<A>, MethodError> {
        match self {
            MethodResponse::Ok(invocation) => Ok(invocation),
            MethodResponse::Error(err) => Err(err),
        }
    }
}

impl<A> From<MethodError> for MethodResponse<A> {
    fn from(err: MethodError) -> Self {
        MethodResponse::Error(err)
    }
}

impl<A> From<Invocation<A>> for MethodResponse<A> {
    fn from(invocation: Invocation<A>) -> Self {
        MethodResponse::Ok(invocation)
    }
}

/// Batch of method results returned by the server
#[derive(Debug, Clone, PartialEq)]
pub struct Response<A> {
    responses: Vec<MethodResponse<A>>,
    created_ids: Option<CreatedIds>,
    session_state: String,
}

impl<A> Response<A> {
    /// Create a response with the given session state and no results.
    pub fn new(session_state: impl Into<String>) -> Self {
        Self {
            responses: Vec::new(),
            created_ids: None,
            session_state: session_state.into(),
        }
    }

    /// Create a response from all of its parts.
    pub fn from_parts(
        responses: Vec<MethodResponse<A>>,
        created_ids: Option<CreatedIds>,
        session_state: impl Into<String>,
    ) -> Self {
        Self {
            responses,
            created_ids,
            session_state: session_state.into(),
        }
    }

    /// Append a result.
    pub fn with_response(mut self, response: impl Into<MethodResponse<A>>) -> Self {
        self.responses.push(response.into());
        self
    }

    /// Set the creation id mapping.
    pub fn with_created_ids(mut self, created_ids: CreatedIds) -> Self {
        self.created_ids = Some(created_ids);
        self
    }

    /// Method results in request order
    pub fn responses(&self) -> &[MethodResponse<A>] {
        &self.responses
    }

    /// Creation id mapping, if present
    pub fn created_ids(&self) -> Option<&CreatedIds> {
        self.created_ids.as_ref()
    }

    /// Session state token at the time the response was produced
    pub fn session_state(&self) -> &str {
        &self.session_state
    }

    /// Take the method results
    pub fn into_responses(self) -> Vec<MethodResponse<A>> {
        self.responses
    }

    /// Find the first result for a call-id.
    pub fn find(&self, call_id: &str) -> Option<&MethodResponse<A>> {
        self.responses.iter().find(|r| r.call_id() == call_id)
    }

    /// Decode a response body.
    ///
    /// Entries named `"error"` always decode to [`MethodResponse::Error`],
    /// whatever `registry` contains.
    pub fn from_json(data: &str, registry: &Registry<A>) -> Result<Self> {
        codec::decode_response(data, registry)
    }
}

impl<A: Serialize> Response<A> {
    /// Encode the response body.
    pub fn to_json(&self) -> Result<String> {
        codec::encode_response(self)
    }
}
