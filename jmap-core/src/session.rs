//! Session resource
//!
//! The session object tells a client what the server supports, which
//! accounts the credentials can reach and where to send API, upload and
//! download requests. Decoding fails unless the `urn:ietf:params:jmap:core`
//! capability is present, because its limits govern every later request.
//!
//! Capability objects other than core are kept as JSON, so a decoded session
//! serializes back to an equivalent document.

use crate::error::{Error, Result};
use crate::types::{Id, UnsignedInt};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Capability URI of JMAP Core.
pub const CORE_CAPABILITY: &str = "urn:ietf:params:jmap:core";

/// Collation algorithm from the RFC 4790 registry
///
/// The "i;octet" collation is deliberately absent: it must not be used
/// unless a protocol explicitly allows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollationAlgorithm {
    /// `i;ascii-numeric` (RFC 4790): unsigned decimal integers stored as
    /// strings. Input is truncated at the first non-digit; strings not
    /// starting with a digit represent positive infinity.
    AsciiNumeric,
    /// `i;ascii-casemap` (RFC 4790): octet strings with US-ASCII letters
    /// compared case-insensitively.
    AsciiCasemap,
    /// `i;unicode-casemap` (RFC 5051): case-insensitive comparison of
    /// Unicode strings.
    UnicodeCasemap,
    /// Any other registered collation.
    Other(String),
}

impl CollationAlgorithm {
    /// Registry identifier
    pub fn as_str(&self) -> &str {
        match self {
            CollationAlgorithm::AsciiNumeric => "i;ascii-numeric",
            CollationAlgorithm::AsciiCasemap => "i;ascii-casemap",
            CollationAlgorithm::UnicodeCasemap => "i;unicode-casemap",
            CollationAlgorithm::Other(name) => name,
        }
    }
}

impl From<&str> for CollationAlgorithm {
    fn from(name: &str) -> Self {
        match name {
            "i;ascii-numeric" => CollationAlgorithm::AsciiNumeric,
            "i;ascii-casemap" => CollationAlgorithm::AsciiCasemap,
            "i;unicode-casemap" => CollationAlgorithm::UnicodeCasemap,
            other => CollationAlgorithm::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CollationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CollationAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CollationAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(CollationAlgorithm::from(name.as_str()))
    }
}

/// Limits advertised under the core capability
///
/// Missing members decode as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreCapability {
    /// Maximum size in octets of a single upload.
    pub max_size_upload: UnsignedInt,
    /// Maximum number of concurrent requests to the upload endpoint.
    pub max_concurrent_upload: UnsignedInt,
    /// Maximum size in octets of a single API request.
    pub max_size_request: UnsignedInt,
    /// Maximum number of concurrent requests to the API endpoint.
    pub max_concurrent_requests: UnsignedInt,
    /// Maximum number of method calls in a single API request.
    pub max_calls_in_request: UnsignedInt,
    /// Maximum number of objects a single /get call may request.
    pub max_objects_in_get: UnsignedInt,
    /// Maximum number of objects a single /set call may create, update and
    /// destroy combined.
    pub max_objects_in_set: UnsignedInt,
    /// Collations the server supports when sorting query results.
    pub collation_algorithms: Vec<CollationAlgorithm>,
}

/// A collection of data (mail, contacts, ...) reachable with the session's
/// credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Account {
    /// User-friendly name, e.g. the owner's email address.
    pub name: String,
    /// Whether the account belongs to the authenticated user.
    pub is_personal: bool,
    /// Whether the entire account is read-only.
    pub is_read_only: bool,
    /// Per-capability information for this account.
    pub account_capabilities: BTreeMap<String, Value>,
}

/// The JMAP session resource
///
/// # Examples
///
/// ```rust
/// use jmap_core::{Id, Session};
///
/// let json = r#"{
///     "capabilities": {"urn:ietf:params:jmap:core": {"maxCallsInRequest": 16}},
///     "accounts": {},
///     "primaryAccounts": {},
///     "username": "john@example.com",
///     "apiUrl": "https://jmap.example.com/api/",
///     "downloadUrl": "https://jmap.example.com/download/{accountId}/{blobId}/{name}?accept={type}",
///     "uploadUrl": "https://jmap.example.com/upload/{accountId}/",
///     "eventSourceUrl": "https://jmap.example.com/eventsource/",
///     "state": "75128aab4b1b"
/// }"#;
/// let session: Session = serde_json::from_str(json).unwrap();
/// assert_eq!(session.core.max_calls_in_request.0, 16);
/// assert_eq!(
///     session.upload_url(&Id::from("A1")),
///     "https://jmap.example.com/upload/A1/"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Capability objects keyed by capability URI, as received.
    pub capabilities: BTreeMap<String, Value>,
    /// Decoded `urn:ietf:params:jmap:core` capability.
    #[serde(skip)]
    pub core: CoreCapability,
    /// Accounts keyed by account id.
    pub accounts: BTreeMap<Id, Account>,
    /// Default account per capability URI.
    pub primary_accounts: BTreeMap<String, Id>,
    /// Username for the credentials, possibly empty.
    pub username: String,
    /// URL for API requests.
    pub api_url: String,
    /// RFC 6570 level 1 template for downloads.
    pub download_url: String,
    /// RFC 6570 level 1 template for uploads.
    pub upload_url: String,
    /// RFC 6570 level 1 template for push event sources.
    pub event_source_url: String,
    /// Changes whenever any other property changes.
    pub state: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SessionFields {
    capabilities: BTreeMap<String, Value>,
    accounts: BTreeMap<Id, Account>,
    primary_accounts: BTreeMap<String, Id>,
    username: String,
    api_url: String,
    download_url: String,
    upload_url: String,
    event_source_url: String,
    state: String,
}

impl TryFrom<SessionFields> for Session {
    type Error = Error;

    fn try_from(fields: SessionFields) -> Result<Self> {
        let core = fields
            .capabilities
            .get(CORE_CAPABILITY)
            .ok_or(Error::MissingCoreCapability)?;
        let core = CoreCapability::deserialize(core)?;

        Ok(Session {
            core,
            capabilities: fields.capabilities,
            accounts: fields.accounts,
            primary_accounts: fields.primary_accounts,
            username: fields.username,
            api_url: fields.api_url,
            download_url: fields.download_url,
            upload_url: fields.upload_url,
            event_source_url: fields.event_source_url,
            state: fields.state,
        })
    }
}

impl<'de> Deserialize<'de> for Session {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = SessionFields::deserialize(deserializer)?;
        Session::try_from(fields).map_err(serde::de::Error::custom)
    }
}

impl Session {
    /// Whether the server supports a capability
    pub fn has_capability(&self, uri: &str) -> bool {
        self.capabilities.contains_key(uri)
    }

    /// Decode the capability object for `uri`
    ///
    /// Returns `Ok(None)` when the server does not advertise it.
    pub fn capability<T: DeserializeOwned>(&self, uri: &str) -> Result<Option<T>> {
        self.capabilities
            .get(uri)
            .map(|value| T::deserialize(value).map_err(Error::from))
            .transpose()
    }

    /// Primary account for a capability
    pub fn primary_account(&self, capability: &str) -> Option<&Id> {
        self.primary_accounts.get(capability)
    }

    /// Upload endpoint for an account
    pub fn upload_url(&self, account_id: &Id) -> String {
        expand_template(&self.upload_url, &[("accountId", account_id.as_str())])
    }

    /// Download endpoint for a blob
    ///
    /// `name` is the file name the server should suggest and `content_type`
    /// the media type it should report.
    pub fn download_url(
        &self,
        account_id: &Id,
        blob_id: &Id,
        name: &str,
        content_type: &str,
    ) -> String {
        expand_template(
            &self.download_url,
            &[
                ("accountId", account_id.as_str()),
                ("blobId", blob_id.as_str()),
                ("name", name),
                ("type", content_type),
            ],
        )
    }
}

/// Everything but RFC 3986 unreserved characters is escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// RFC 6570 level 1 expansion: `{var}` is replaced with the percent-encoded
/// value. Unknown variables are left in place.
fn expand_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &rest[start + 1..start + len];
        match vars.iter().find(|(var, _)| *var == name) {
            Some((_, value)) => out.extend(utf8_percent_encode(value, UNRESERVED)),
            None => out.push_str(&rest[start..=start + len]),
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}
