//! Blob upload metadata

use crate::types::{Id, UnsignedInt};
use serde::{Deserialize, Serialize};

/// Object returned by the upload endpoint
///
/// The server may return the same blob id for repeated uploads of the same
/// data, and an unused blob id may expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobInfo {
    /// Account the blob was uploaded to.
    pub account_id: Id,
    /// Id of the immutable binary data.
    pub blob_id: Id,
    /// Media type given in the upload's Content-Type header.
    #[serde(rename = "type")]
    pub content_type: String,
    /// Size in octets.
    pub size: UnsignedInt,
}
