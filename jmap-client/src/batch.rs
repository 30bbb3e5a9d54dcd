//! Batch request building
//!
//! A JMAP request is already a batch: one HTTP body carries many method
//! calls, each tagged with a call-id the server echoes back. [`Batch`] assigns
//! call-ids by position so later calls can refer to earlier results.
//!
//! # Call-id Scheme
//!
//! The n-th call added (counting from 1) gets the call-id `n - 1` as decimal
//! text. [`Batch::next_call_id`] tells the id the next [`Batch::add`] will use,
//! which is what a result reference in that call's arguments needs to point
//! backwards with [`Batch::nth_call_id`].
//!
//! # Examples
//!
//! ```rust
//! use jmap_client::Batch;
//! use serde_json::json;
//!
//! let mut batch = Batch::new();
//! batch.use_capability("urn:ietf:params:jmap:core");
//! batch.use_capability("urn:ietf:params:jmap:mail");
//!
//! let query = batch.add("Email/query", json!({"accountId": "A1"}));
//! assert_eq!(query, "0");
//! batch.add("Email/get", json!({
//!     "accountId": "A1",
//!     "#ids": {"resultOf": batch.nth_call_id(1), "name": "Email/query", "path": "/ids"}
//! }));
//!
//! assert_eq!(batch.next_call_id(), "2");
//! assert_eq!(batch.request().calls().len(), 2);
//! ```

use jmap_core::{Invocation, Request};

/// Builder for a request whose call-ids follow call order
#[derive(Debug, Clone)]
pub struct Batch<A> {
    request: Request<A>,
}

impl<A> Batch<A> {
    /// Create an empty batch
    pub fn new() -> Self {
        Self {
            request: Request::new(Vec::new()),
        }
    }

    /// Call-id the next [`Batch::add`] will assign
    pub fn next_call_id(&self) -> String {
        self.request.calls().len().to_string()
    }

    /// Call-id of the n-th call, counting from 1
    ///
    /// `n` of 0 is treated as 1.
    pub fn nth_call_id(&self, n: usize) -> String {
        n.saturating_sub(1).to_string()
    }

    /// Declare a capability the request relies on
    pub fn use_capability(&mut self, capability: impl Into<String>) {
        self.request.use_capability(capability);
    }

    /// Append a call and return its call-id
    pub fn add(&mut self, name: impl Into<String>, args: A) -> String {
        let call_id = self.next_call_id();
        self.request
            .push_call(Invocation::new(name, call_id.clone(), args));
        call_id
    }

    /// Get the total number of calls in the batch
    pub fn len(&self) -> usize {
        self.request.calls().len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The request built so far
    pub fn request(&self) -> &Request<A> {
        &self.request
    }

    /// Finish building
    pub fn into_request(self) -> Request<A> {
        self.request
    }
}

impl<A> Default for Batch<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_batch_creation() {
        let batch: Batch<Value> = Batch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.next_call_id(), "0");
        assert!(batch.request().using().is_empty());
    }

    #[test]
    fn test_call_ids_follow_order() {
        let mut batch = Batch::new();

        assert_eq!(batch.add("Mailbox/get", json!({})), "0");
        assert_eq!(batch.next_call_id(), "1");
        assert_eq!(batch.add("Mailbox/changes", json!({})), "1");
        assert_eq!(batch.next_call_id(), "2");

        let ids: Vec<&str> = batch.request().calls().iter().map(|c| c.call_id()).collect();
        assert_eq!(ids, ["0", "1"]);
    }

    #[test]
    fn test_next_call_id_is_stable() {
        let mut batch: Batch<Value> = Batch::new();
        batch.add("Core/echo", json!({}));

        // only add advances the counter
        assert_eq!(batch.next_call_id(), "1");
        assert_eq!(batch.next_call_id(), "1");
        batch.use_capability("urn:ietf:params:jmap:core");
        assert_eq!(batch.next_call_id(), "1");
    }

    #[test]
    fn test_nth_call_id() {
        let batch: Batch<Value> = Batch::new();
        assert_eq!(batch.nth_call_id(1), "0");
        assert_eq!(batch.nth_call_id(3), "2");
        assert_eq!(batch.nth_call_id(0), "0");
    }

    #[test]
    fn test_use_capability_deduplicates() {
        let mut batch: Batch<Value> = Batch::new();
        batch.use_capability("urn:ietf:params:jmap:core");
        batch.use_capability("urn:ietf:params:jmap:core");
        batch.use_capability("urn:ietf:params:jmap:mail");

        assert_eq!(
            batch.into_request().using(),
            ["urn:ietf:params:jmap:core", "urn:ietf:params:jmap:mail"]
        );
    }

    #[test]
    fn test_request_encodes() {
        let mut batch = Batch::new();
        batch.use_capability("urn:ietf:params:jmap:core");
        batch.add("Core/echo", json!({"hello": true}));

        assert_eq!(
            batch.request().to_json().unwrap(),
            r#"{"using":["urn:ietf:params:jmap:core"],"methodCalls":[["Core/echo",{"hello":true},"0"]]}"#
        );
    }
}
