//! Error types for jmap
//!
//! This module separates two very different kinds of failure:
//!
//! - **Error**: failures of *this library* while encoding or decoding protocol
//!   data (malformed invocations, out-of-range integers, unknown methods, ...).
//!   These are returned as `Err` values and never travel over the wire.
//! - **RequestError** and **MethodError**: failures reported *by the protocol*.
//!   They are first-class wire objects that round-trip losslessly, and are
//!   modelled as data rather than as library failures.
//!
//! # Request-level vs method-level errors
//!
//! A JMAP server rejects a whole request with an RFC 7807 "problem details"
//! object ([`RequestError`]), for example when the body is not JSON or a
//! server limit was exceeded. When only one call of a batch fails, the server
//! substitutes a [`MethodError`] for that call's response, under the reserved
//! method name `"error"` and with the call-id of the failed call.
//!
//! Both shapes are flat JSON objects with a few reserved keys and an open set
//! of extension keys. They are decoded into named fields plus a property bag,
//! and encoded by merging the named fields over a copy of the bag, so a named
//! field always wins over a bag entry with the same key.
//!
//! # Examples
//!
//! ```rust
//! use jmap_core::{ErrorCode, MethodError, ProblemType, RequestError};
//!
//! let err = RequestError::new(ProblemType::UnknownCapability)
//!     .with_status(400)
//!     .with_detail("capability not supported");
//! let json = serde_json::to_string(&err).unwrap();
//! assert!(json.contains("urn:ietf:params:jmap:error:unknownCapability"));
//!
//! let call_err = MethodError::new(ErrorCode::UnknownMethod, "c1");
//! assert_eq!(serde_json::to_string(&call_err).unwrap(), r#"{"type":"unknownMethod"}"#);
//! ```

use crate::error_code::ErrorCode;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Result type for jmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Library-level error type
///
/// Each variant names one specific violation so callers can tell a malformed
/// triplet from an unknown method or an out-of-range integer without
/// inspecting message text.
///
/// # Error Categories
///
/// - **Format errors**: InvocationArity, ArgumentsNotObject, InvalidPointerSyntax,
///   MissingErrorType, MissingCoreCapability, Serialization
/// - **Validation errors**: OutOfRange, InvalidId, InvalidDate, NotUtc
/// - **Lookup errors**: UnknownMethod, NoPointerValue, UnresolvedReference
/// - **Collaborator errors**: Request, Method, Http, Transport, SessionEndpointMissing,
///   Entropy, Internal
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An invocation was not a JSON array of exactly three elements.
    #[error("malformed invocation: need exactly 3 elements, got {0}")]
    InvocationArity(usize),

    /// The arguments element of an invocation was not a JSON object.
    #[error("malformed invocation: arguments must be an object")]
    ArgumentsNotObject,

    /// No argument decoder is registered for this method name.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// A bounded integer fell outside the range allowed by the protocol.
    #[error("integer value is not within allowed range")]
    OutOfRange,

    /// An identifier is empty, too long or uses characters outside the
    /// URL-safe base64 alphabet.
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    /// A date string is not valid RFC 3339.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A UTC date was received with an offset other than `Z`.
    #[error("date is not in UTC: {0:?}")]
    NotUtc(String),

    /// A JSON pointer does not match the RFC 6901 grammar.
    #[error("invalid json pointer syntax: {0:?}")]
    InvalidPointerSyntax(String),

    /// A syntactically valid JSON pointer did not address any value.
    #[error("no pointer value: {0:?}")]
    NoPointerValue(String),

    /// A result reference names a call-id and method that match no response.
    #[error("result reference {0} matches no response")]
    UnresolvedReference(String),

    /// An error object was decoded without its mandatory `type` field.
    #[error("missing type field in error object")]
    MissingErrorType,

    /// A session object lacks the `urn:ietf:params:jmap:core` capability.
    #[error("urn:ietf:params:jmap:core capability object is missing")]
    MissingCoreCapability,

    /// Serialization or deserialization error
    ///
    /// Covers malformed JSON and values whose own (de)serialization rejected
    /// them, such as an out-of-range integer nested inside call arguments.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The server (or the client on its behalf) rejected the whole request.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// A method call came back as a method error where success was required.
    #[error("method error: {0}")]
    Method(#[from] MethodError),

    /// The server answered with a non-success HTTP status and no problem
    /// details body.
    #[error("HTTP {status}")]
    Http {
        /// HTTP status code of the reply
        status: u16,
    },

    /// The transport collaborator failed to deliver the request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A client operation was attempted without a session endpoint.
    #[error("session endpoint is empty")]
    SessionEndpointMissing,

    /// Internal error, e.g. failing to set up observability.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The operating system random source failed.
    #[error("random source failure: {0}")]
    Entropy(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Prefix added to an error code when it is reported as a problem type in a
/// request-level error.
pub const PROBLEM_PREFIX: &str = "urn:ietf:params:jmap:error:";

/// Problem type URI of a request-level error
///
/// The four problem types defined by JMAP Core are named variants. Any other
/// URI (including ones from extensions) is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProblemType {
    /// The client included a capability in "using" that the server does not
    /// support.
    UnknownCapability,
    /// The content type of the request was not application/json or the
    /// request did not parse as I-JSON.
    NotJson,
    /// The request parsed as JSON but did not match the type signature of the
    /// Request object.
    NotRequest,
    /// The request exceeded a server limit; the `limit` property names it.
    Limit,
    /// Any other problem type URI.
    Other(String),
}

impl ProblemType {
    /// Full problem type URI as it appears in the `type` field.
    pub fn uri(&self) -> Cow<'_, str> {
        let code = match self {
            ProblemType::UnknownCapability => "unknownCapability",
            ProblemType::NotJson => "notJSON",
            ProblemType::NotRequest => "notRequest",
            ProblemType::Limit => "limit",
            ProblemType::Other(uri) => return Cow::Borrowed(uri),
        };
        Cow::Owned(format!("{PROBLEM_PREFIX}{code}"))
    }

    /// Parse a problem type URI.
    pub fn from_uri(uri: &str) -> Self {
        match uri.strip_prefix(PROBLEM_PREFIX) {
            Some("unknownCapability") => ProblemType::UnknownCapability,
            Some("notJSON") => ProblemType::NotJson,
            Some("notRequest") => ProblemType::NotRequest,
            Some("limit") => ProblemType::Limit,
            _ => ProblemType::Other(uri.to_string()),
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Request-level error, an RFC 7807 "problem details" object
///
/// Only `type` is mandatory on the wire. Every key other than the five fixed
/// ones is captured in `properties`, e.g. the `limit` key of a
/// [`ProblemType::Limit`] error.
///
/// # Wire Format
///
/// Encoded as one flat object. Absent optional fields are omitted. When a
/// property-bag key collides with a fixed field, the fixed field is written.
///
/// ```rust
/// use jmap_core::{ProblemType, RequestError};
///
/// let json = r#"{"type":"urn:ietf:params:jmap:error:limit","limit":"maxSizeRequest","status":400}"#;
/// let err: RequestError = serde_json::from_str(json).unwrap();
/// assert_eq!(err.problem_type, ProblemType::Limit);
/// assert_eq!(err.status, Some(400));
/// assert_eq!(err.properties["limit"], "maxSizeRequest");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestError {
    /// A URI reference that identifies the problem type.
    pub problem_type: ProblemType,
    /// A short, human-readable summary of the problem type.
    pub title: Option<String>,
    /// The HTTP status code.
    pub status: Option<u16>,
    /// A human-readable explanation specific to this occurrence of the problem.
    pub detail: Option<String>,
    /// A URI reference that identifies the specific occurrence of the problem.
    pub instance: Option<String>,
    /// All other fields.
    pub properties: Map<String, Value>,
}

impl RequestError {
    /// Create a request error with only its problem type set.
    pub fn new(problem_type: ProblemType) -> Self {
        Self {
            problem_type,
            title: None,
            status: None,
            detail: None,
            instance: None,
            properties: Map::new(),
        }
    }

    /// Create a `limit` problem naming the exceeded limit, as a client does
    /// when it refuses to send an oversized request.
    pub fn limit(limit: impl Into<String>) -> Self {
        Self::new(ProblemType::Limit).with_property("limit", Value::String(limit.into()))
    }

    /// Set the summary.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the occurrence-specific explanation.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the occurrence URI.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Add an extension property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.detail, &self.title) {
            (Some(detail), _) => f.write_str(detail),
            (None, Some(title)) => f.write_str(title),
            (None, None) => write!(f, "{}", self.problem_type),
        }
    }
}

impl std::error::Error for RequestError {}

impl Serialize for RequestError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut all = self.properties.clone();
        let uri = self.problem_type.uri();
        if !uri.is_empty() {
            all.insert("type".into(), Value::String(uri.into_owned()));
        }
        // zero-valued fields are left out of the document
        let text = [
            ("title", &self.title),
            ("detail", &self.detail),
            ("instance", &self.instance),
        ];
        for (key, value) in text {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                all.insert(key.into(), Value::String(value.to_string()));
            }
        }
        if let Some(status) = self.status.filter(|s| *s != 0) {
            all.insert("status".into(), Value::from(status));
        }
        all.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RequestError {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut properties = Map::<String, Value>::deserialize(deserializer)?;
        let problem_type = match take_string(&mut properties, "type").map_err(de::Error::custom)? {
            Some(uri) => ProblemType::from_uri(&uri),
            None => return Err(de::Error::custom(Error::MissingErrorType)),
        };
        let title = take_string(&mut properties, "title").map_err(de::Error::custom)?;
        let detail = take_string(&mut properties, "detail").map_err(de::Error::custom)?;
        let instance = take_string(&mut properties, "instance").map_err(de::Error::custom)?;
        let status = match properties.remove("status") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|n| u16::try_from(n).ok())
                    .ok_or_else(|| de::Error::custom(format!("invalid status: {value}")))?,
            ),
        };
        Ok(Self {
            problem_type,
            title,
            status,
            detail,
            instance,
            properties,
        })
    }
}

/// Method-level error, substituted for the response of a single failed call
///
/// On the wire it is the arguments object of an invocation named `"error"`:
/// `type` holds the [`ErrorCode`] and any other keys land in `properties`.
/// The call-id is kept alongside, not inside the object, so the envelope
/// can put it in the third tuple position.
///
/// # Examples
///
/// ```rust
/// use jmap_core::{ErrorCode, MethodError};
/// use serde_json::json;
///
/// let err = MethodError::new(ErrorCode::InvalidArguments, "call-3")
///     .with_property("description", json!("accountId is missing"));
/// assert_eq!(err.description(), Some("accountId is missing"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MethodError {
    /// Call-id of the failed call. Not serialized as a field.
    pub call_id: String,
    /// The error code.
    pub error_type: ErrorCode,
    /// All fields other than `type`.
    pub properties: Map<String, Value>,
}

impl MethodError {
    /// Reserved method name under which method errors are returned.
    pub const METHOD_NAME: &'static str = "error";

    /// Create a method error for the given call.
    pub fn new(error_type: ErrorCode, call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            error_type,
            properties: Map::new(),
        }
    }

    /// Add an extension property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// The optional human-readable `description` property.
    pub fn description(&self) -> Option<&str> {
        self.properties.get("description").and_then(Value::as_str)
    }

    /// Decode the arguments object of an `"error"` invocation.
    ///
    /// This is the built-in decoder the envelope consults for the reserved
    /// method name regardless of the caller's registry.
    pub fn decode_args(call_id: &str, args: &RawValue) -> Result<Self> {
        let mut properties: Map<String, Value> = serde_json::from_str(args.get())?;
        let error_type = match take_string(&mut properties, "type")? {
            Some(code) => ErrorCode::from(code.as_str()),
            None => return Err(Error::MissingErrorType),
        };
        Ok(Self {
            call_id: call_id.to_string(),
            error_type,
            properties,
        })
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(description) => write!(f, "{}: {}", self.error_type, description),
            None => write!(f, "{}", self.error_type),
        }
    }
}

impl std::error::Error for MethodError {}

impl Serialize for MethodError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut all = self.properties.clone();
        all.insert("type".into(), Value::String(self.error_type.as_str().to_string()));
        all.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MethodError {
    /// Decodes the arguments object only; `call_id` is left empty.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut properties = Map::<String, Value>::deserialize(deserializer)?;
        let error_type = match take_string(&mut properties, "type").map_err(de::Error::custom)? {
            Some(code) => ErrorCode::from(code.as_str()),
            None => return Err(de::Error::custom(Error::MissingErrorType)),
        };
        Ok(Self {
            call_id: String::new(),
            error_type,
            properties,
        })
    }
}

/// Remove `key` from the bag, requiring a string (or null) value.
fn take_string(properties: &mut Map<String, Value>, key: &str) -> Result<Option<String>> {
    match properties.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::Serialization(format!(
            "field {key:?} must be a string, got {other}"
        ))),
    }
}
