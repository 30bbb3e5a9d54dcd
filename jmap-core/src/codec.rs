//! Wire codec for invocations, requests and responses
//!
//! JMAP encodes every method call as a positional triplet rather than an
//! object:
//!
//! ```text
//! ["Mailbox/get", {"accountId": "A13824"}, "c1"]
//! ```
//!
//! This module packs and unpacks those triplets and builds the request and
//! response bodies around them.
//!
//! # Two-Phase Decoding
//!
//! Decoding a body happens in two passes. First the envelope and every
//! triplet are parsed structurally, keeping each arguments object as
//! unparsed [`RawValue`] text. Then the arguments are handed to the decoder
//! registered for the method name. A body is returned only once every call
//! decoded; the first failure aborts the whole decode.
//!
//! # Error Handling
//!
//! - Wrong element count → `Error::InvocationArity`
//! - Arguments not an object → `Error::ArgumentsNotObject`
//! - Method without decoder → `Error::UnknownMethod`
//! - Malformed JSON or element types → `Error::Serialization`
//!
//! # Examples
//!
//! ```rust
//! use jmap_core::codec;
//!
//! let inv = codec::decode_invocation(r#"["meth", {"arg1":1}, "callid"]"#).unwrap();
//! assert_eq!(inv.name, "meth");
//! assert_eq!(inv.call_id, "callid");
//! assert_eq!(inv.args.get(), r#"{"arg1":1}"#);
//!
//! let err = codec::decode_invocation(r#"["meth", {}]"#).unwrap_err();
//! assert!(err.to_string().contains("3"));
//! ```

use crate::envelope::{CreatedIds, Invocation, MethodResponse, Request, Response};
use crate::error::{Error, MethodError, Result};
use crate::registry::Registry;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::{to_raw_value, RawValue};

/// Invocation whose arguments are still undecoded JSON text
#[derive(Debug, Clone)]
pub struct RawInvocation {
    /// Method name
    pub name: String,
    /// Arguments object, verbatim
    pub args: Box<RawValue>,
    /// Call-id
    pub call_id: String,
}

impl RawInvocation {
    /// Build from the elements of a decoded JSON array.
    pub fn from_elements(elements: Vec<Box<RawValue>>) -> Result<Self> {
        let [name, args, call_id]: [Box<RawValue>; 3] = elements
            .try_into()
            .map_err(|rest: Vec<Box<RawValue>>| Error::InvocationArity(rest.len()))?;

        let name: String = serde_json::from_str(name.get())?;
        if !is_object(&args) {
            return Err(Error::ArgumentsNotObject);
        }
        let call_id: String = serde_json::from_str(call_id.get())?;

        Ok(Self {
            name,
            args,
            call_id,
        })
    }
}

impl Serialize for RawInvocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.name)?;
        tuple.serialize_element(&self.args)?;
        tuple.serialize_element(&self.call_id)?;
        tuple.end()
    }
}

fn is_object(args: &RawValue) -> bool {
    args.get().trim_start().starts_with('{')
}

fn raw_invocation(name: &str, args: Box<RawValue>, call_id: &str) -> Result<RawInvocation> {
    if !is_object(&args) {
        return Err(Error::ArgumentsNotObject);
    }
    Ok(RawInvocation {
        name: name.to_string(),
        args,
        call_id: call_id.to_string(),
    })
}

/// Encode one invocation as a `[name, args, callId]` triplet
///
/// # Errors
///
/// Returns `Error::ArgumentsNotObject` if `args` is not a JSON object.
pub fn encode_invocation(name: &str, args: &RawValue, call_id: &str) -> Result<String> {
    let raw = raw_invocation(name, args.to_owned(), call_id)?;
    Ok(serde_json::to_string(&raw)?)
}

/// Decode one `[name, args, callId]` triplet
///
/// The arguments are checked to be an object but are otherwise left
/// undecoded.
pub fn decode_invocation(data: &str) -> Result<RawInvocation> {
    let elements: Vec<Box<RawValue>> = serde_json::from_str(data)?;
    RawInvocation::from_elements(elements)
}

#[derive(Serialize)]
struct RequestOut<'a> {
    using: &'a [String],
    #[serde(rename = "createdIds", skip_serializing_if = "Option::is_none")]
    created_ids: Option<&'a CreatedIds>,
    #[serde(rename = "methodCalls")]
    method_calls: Vec<RawInvocation>,
}

#[derive(Deserialize)]
struct RequestIn {
    #[serde(default)]
    using: Vec<String>,
    #[serde(rename = "methodCalls", default)]
    method_calls: Vec<Vec<Box<RawValue>>>,
    #[serde(rename = "createdIds", default)]
    created_ids: Option<CreatedIds>,
}

#[derive(Serialize)]
struct ResponseOut<'a> {
    #[serde(rename = "createdIds", skip_serializing_if = "Option::is_none")]
    created_ids: Option<&'a CreatedIds>,
    #[serde(rename = "sessionState")]
    session_state: &'a str,
    #[serde(rename = "methodResponses")]
    method_responses: Vec<RawInvocation>,
}

#[derive(Deserialize)]
struct ResponseIn {
    #[serde(rename = "methodResponses", default)]
    method_responses: Vec<Vec<Box<RawValue>>>,
    #[serde(rename = "createdIds", default)]
    created_ids: Option<CreatedIds>,
    #[serde(rename = "sessionState", default)]
    session_state: String,
}

/// Encode a request body
///
/// Calls are written in order under `methodCalls`; `createdIds` is written
/// only when present.
///
/// # Examples
///
/// ```rust
/// use jmap_core::{codec, Invocation, Request};
/// use serde_json::json;
///
/// let request = Request::new(vec!["cap".into()])
///     .with_call(Invocation::new("NAME", "id", json!({"arg": "foo"})));
/// assert_eq!(
///     codec::encode_request(&request).unwrap(),
///     r#"{"using":["cap"],"methodCalls":[["NAME",{"arg":"foo"},"id"]]}"#
/// );
/// ```
pub fn encode_request<A: Serialize>(request: &Request<A>) -> Result<String> {
    let method_calls = request
        .calls()
        .iter()
        .map(|call| -> Result<RawInvocation> {
            raw_invocation(call.name(), to_raw_value(call.args())?, call.call_id())
        })
        .collect::<Result<Vec<_>>>()?;

    let body = serde_json::to_string(&RequestOut {
        using: request.using(),
        created_ids: request.created_ids(),
        method_calls,
    })?;
    tracing::debug!(calls = request.calls().len(), bytes = body.len(), "Encoded request");
    Ok(body)
}

/// Decode a request body
///
/// Every call's arguments are decoded by the decoder registered for its
/// method name.
///
/// # Errors
///
/// Fails with `Error::UnknownMethod` for a call whose method is not in
/// `registry`, or with whatever error the first failing decoder returns.
pub fn decode_request<A>(data: &str, registry: &Registry<A>) -> Result<Request<A>> {
    let wire: RequestIn = serde_json::from_str(data)?;
    let raw = wire
        .method_calls
        .into_iter()
        .map(RawInvocation::from_elements)
        .collect::<Result<Vec<_>>>()?;

    let calls = raw
        .into_iter()
        .map(|inv| -> Result<Invocation<A>> {
            let decoder = registry.get(&inv.name).ok_or_else(|| {
                tracing::debug!(method = %inv.name, call_id = %inv.call_id, "Unknown method in request");
                Error::UnknownMethod(inv.name.clone())
            })?;
            let args = decoder.decode(&inv.args)?;
            Ok(Invocation::new(inv.name, inv.call_id, args))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(calls = calls.len(), bytes = data.len(), "Decoded request");
    Ok(Request::from_parts(wire.using, calls, wire.created_ids))
}

/// Encode a response body
///
/// Method errors are written under the reserved name `"error"`.
///
/// # Examples
///
/// ```rust
/// use jmap_core::{codec, ErrorCode, MethodError, Response};
/// use serde_json::Value;
///
/// let response: Response<Value> = Response::new("state!")
///     .with_response(MethodError::new(ErrorCode::UnknownMethod, "id"));
/// assert_eq!(
///     codec::encode_response(&response).unwrap(),
///     r#"{"sessionState":"state!","methodResponses":[["error",{"type":"unknownMethod"},"id"]]}"#
/// );
/// ```
pub fn encode_response<A: Serialize>(response: &Response<A>) -> Result<String> {
    let method_responses = response
        .responses()
        .iter()
        .map(|entry| -> Result<RawInvocation> {
            match entry {
                MethodResponse::Ok(inv) => {
                    raw_invocation(inv.name(), to_raw_value(inv.args())?, inv.call_id())
                }
                MethodResponse::Error(err) => {
                    raw_invocation(MethodError::METHOD_NAME, to_raw_value(err)?, &err.call_id)
                }
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let body = serde_json::to_string(&ResponseOut {
        created_ids: response.created_ids(),
        session_state: response.session_state(),
        method_responses,
    })?;
    tracing::debug!(
        responses = response.responses().len(),
        bytes = body.len(),
        "Encoded response"
    );
    Ok(body)
}

/// Decode a response body
///
/// Entries named `"error"` are decoded as [`MethodError`]s without
/// consulting `registry`; every other entry needs a registered decoder.
pub fn decode_response<A>(data: &str, registry: &Registry<A>) -> Result<Response<A>> {
    let wire: ResponseIn = serde_json::from_str(data)?;
    let raw = wire
        .method_responses
        .into_iter()
        .map(RawInvocation::from_elements)
        .collect::<Result<Vec<_>>>()?;

    let responses = raw
        .into_iter()
        .map(|inv| -> Result<MethodResponse<A>> {
            if inv.name == MethodError::METHOD_NAME {
                let err = MethodError::decode_args(&inv.call_id, &inv.args)?;
                tracing::trace!(call_id = %inv.call_id, error_type = %err.error_type, "Method error in response");
                return Ok(MethodResponse::Error(err));
            }
            let decoder = registry.get(&inv.name).ok_or_else(|| {
                tracing::debug!(method = %inv.name, call_id = %inv.call_id, "Unknown method in response");
                Error::UnknownMethod(inv.name.clone())
            })?;
            let args = decoder.decode(&inv.args)?;
            Ok(MethodResponse::Ok(Invocation::new(inv.name, inv.call_id, args)))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        responses = responses.len(),
        bytes = data.len(),
        "Decoded response"
    );
    Ok(Response::from_parts(
        responses,
        wire.created_ids,
        wire.session_state,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_code::ErrorCode;
    use crate::types::Id;
    use serde::Deserialize;
    use serde_json::{json, Map, Value};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestArgs {
        arg: String,
    }

    fn test_registry() -> Registry<TestArgs> {
        let mut registry = Registry::new();
        registry.register_typed("NAME", |args: TestArgs| args);
        registry
    }

    #[test]
    fn test_decode_invocation() {
        let inv = decode_invocation(r#"["meth", {"arg1":1}, "callid"]"#).unwrap();
        assert_eq!(inv.name, "meth");
        assert_eq!(inv.call_id, "callid");
        assert_eq!(inv.args.get(), r#"{"arg1":1}"#);
    }

    #[test]
    fn test_decode_invocation_arity() {
        let err = decode_invocation(r#"["meth", {"arg1":1}]"#).unwrap_err();
        assert!(matches!(err, Error::InvocationArity(2)));
        assert!(err.to_string().contains("3"));

        let err = decode_invocation(r#"["meth", {}, "a", "b"]"#).unwrap_err();
        assert!(matches!(err, Error::InvocationArity(4)));
    }

    #[test]
    fn test_decode_invocation_non_object_args() {
        let err = decode_invocation(r#"["meth", null, "callid"]"#).unwrap_err();
        assert!(matches!(err, Error::ArgumentsNotObject));
        assert!(err.to_string().contains("object"));

        let err = decode_invocation(r#"["meth", [1], "callid"]"#).unwrap_err();
        assert!(matches!(err, Error::ArgumentsNotObject));
    }

    #[test]
    fn test_decode_invocation_bad_element_types() {
        let err = decode_invocation(r#"[1, {}, "callid"]"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(decode_invocation(r#"{"a":1}"#).is_err());
    }

    #[test]
    fn test_encode_invocation() {
        let args = to_raw_value(&json!({"arg1": 1})).unwrap();
        let json = encode_invocation("meth", &args, "callid").unwrap();
        assert_eq!(json, r#"["meth",{"arg1":1},"callid"]"#);

        let args = to_raw_value(&json!(null)).unwrap();
        let err = encode_invocation("meth", &args, "callid").unwrap_err();
        assert!(matches!(err, Error::ArgumentsNotObject));
    }

    #[test]
    fn test_request_encode() {
        let request = Request::new(vec!["cap".into()]).with_call(Invocation::new(
            "NAME",
            "id",
            TestArgs { arg: "foo".into() },
        ));
        assert_eq!(
            encode_request(&request).unwrap(),
            r#"{"using":["cap"],"methodCalls":[["NAME",{"arg":"foo"},"id"]]}"#
        );
    }

    #[test]
    fn test_request_decode() {
        let json = r#"{"using":["cap"],"methodCalls":[["NAME",{"arg":"foo"},"id"]]}"#;
        let request = decode_request(json, &test_registry()).unwrap();

        assert_eq!(request.using(), ["cap".to_string()]);
        assert_eq!(request.calls().len(), 1);
        assert_eq!(request.calls()[0].name(), "NAME");
        assert_eq!(request.calls()[0].call_id(), "id");
        assert_eq!(request.calls()[0].args(), &TestArgs { arg: "foo".into() });
        assert!(request.created_ids().is_none());

        // encoding the decoded value reproduces the input
        assert_eq!(encode_request(&request).unwrap(), json);
    }

    #[test]
    fn test_request_decode_unknown_method() {
        let json = r#"{"using":["cap"],"methodCalls":[["NAME",{"arg":"foo"},"id"],["OTHER",{},"id2"]]}"#;
        let err = decode_request(json, &test_registry()).unwrap_err();
        assert!(matches!(err, Error::UnknownMethod(ref m) if m == "OTHER"));
        assert!(err.to_string().contains("unknown method"));
    }

    #[test]
    fn test_request_decode_is_atomic() {
        // second call fails in its decoder, so nothing is returned
        let json = r#"{"using":[],"methodCalls":[["NAME",{"arg":"foo"},"a"],["NAME",{"arg":1},"b"]]}"#;
        assert!(decode_request(json, &test_registry()).is_err());
    }

    #[test]
    fn test_request_created_ids() {
        let mut created = CreatedIds::new();
        created.insert(Id::from("k1"), Id::from("M1"));
        let request: Request<TestArgs> =
            Request::new(vec!["cap".into()]).with_created_ids(created.clone());

        let json = encode_request(&request).unwrap();
        assert_eq!(
            json,
            r#"{"using":["cap"],"createdIds":{"k1":"M1"},"methodCalls":[]}"#
        );

        let decoded = decode_request(&json, &test_registry()).unwrap();
        assert_eq!(decoded.created_ids(), Some(&created));
    }

    #[test]
    fn test_response_with_method_error() {
        let json = r#"{"sessionState":"state!","methodResponses":[["error",{"type":"unknownMethod"},"id"]]}"#;

        // an empty registry is enough for error entries
        let response = decode_response(json, &Registry::<Value>::new()).unwrap();
        assert_eq!(response.session_state(), "state!");
        let err = response.responses()[0].as_error().unwrap();
        assert_eq!(err.error_type, ErrorCode::UnknownMethod);
        assert_eq!(err.call_id, "id");

        assert_eq!(encode_response(&response).unwrap(), json);
    }

    #[test]
    fn test_response_error_overlay_beats_registry() {
        let mut registry: Registry<Map<String, Value>> = Registry::new();
        registry.register_object("error");

        let json = r#"{"sessionState":"s","methodResponses":[["error",{"type":"serverFail"},"c"]]}"#;
        let response = decode_response(json, &registry).unwrap();
        assert!(response.responses()[0].is_error());
    }

    #[test]
    fn test_response_field_order() {
        let mut created = CreatedIds::new();
        created.insert(Id::from("abc"), Id::from("abc"));
        let response: Response<TestArgs> = Response::new("state!")
            .with_created_ids(created)
            .with_response(Invocation::new("NAME", "id", TestArgs { arg: "x".into() }));

        assert_eq!(
            encode_response(&response).unwrap(),
            r#"{"createdIds":{"abc":"abc"},"sessionState":"state!","methodResponses":[["NAME",{"arg":"x"},"id"]]}"#
        );
    }

    #[test]
    fn test_response_decode_mixed() {
        let json = r#"{
            "methodResponses": [
                ["NAME", {"arg": "one"}, "a"],
                ["error", {"type": "invalidArguments", "description": "nope"}, "b"]
            ],
            "sessionState": "75128aab4b1b"
        }"#;
        let response = decode_response(json, &test_registry()).unwrap();

        assert_eq!(response.responses().len(), 2);
        match &response.responses()[0] {
            MethodResponse::Ok(inv) => assert_eq!(inv.args().arg, "one"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            response.responses()[1].as_error().unwrap().description(),
            Some("nope")
        );
    }

    #[test]
    fn test_response_error_without_type() {
        let json = r#"{"sessionState":"s","methodResponses":[["error",{},"c"]]}"#;
        let err = decode_response(json, &test_registry()).unwrap_err();
        assert!(matches!(err, Error::MissingErrorType));
    }

    #[test]
    fn test_response_unknown_method() {
        let json = r#"{"sessionState":"s","methodResponses":[["Foo/get",{},"c"]]}"#;
        let err = decode_response(json, &test_registry()).unwrap_err();
        assert!(matches!(err, Error::UnknownMethod(_)));
    }
}
