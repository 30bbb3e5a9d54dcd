//! Method dispatch registry
//!
//! Arguments of a method call arrive as opaque JSON text. Which Rust type
//! they decode into depends on the method name, and only the caller knows
//! the set of methods it speaks. A [`Registry`] maps method names to argument
//! decoders producing a caller-chosen type `A`, typically an enum with one
//! variant per method.
//!
//! # Thread Safety
//!
//! Registries are cheaply cloneable (`Arc`-based) and `Send + Sync`. The
//! envelope only ever reads from them, so one registry can serve any number
//! of concurrent decodes.
//!
//! # Examples
//!
//! ```rust
//! use jmap_core::Registry;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct EchoArgs {
//!     hello: bool,
//! }
//!
//! #[derive(Debug)]
//! enum Args {
//!     Echo(EchoArgs),
//! }
//!
//! let mut registry = Registry::new();
//! registry.register_typed("Core/echo", Args::Echo);
//!
//! assert!(registry.contains("Core/echo"));
//! assert!(!registry.contains("Mailbox/get"));
//! ```

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decoder of one method's arguments
///
/// Implemented for every `Fn(&RawValue) -> Result<A>` closure, so most
/// decoders never name this trait.
pub trait ArgsDecoder<A>: Send + Sync {
    /// Decode the arguments object of a call.
    fn decode(&self, args: &RawValue) -> Result<A>;
}

impl<A, F> ArgsDecoder<A> for F
where
    F: Fn(&RawValue) -> Result<A> + Send + Sync,
{
    fn decode(&self, args: &RawValue) -> Result<A> {
        self(args)
    }
}

/// Map of method names to argument decoders
pub struct Registry<A> {
    decoders: Arc<HashMap<String, Arc<dyn ArgsDecoder<A>>>>,
}

impl<A> Registry<A> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            decoders: Arc::new(HashMap::new()),
        }
    }

    /// Register a decoder for a method, replacing any previous one
    pub fn register<D>(&mut self, method: impl Into<String>, decoder: D)
    where
        D: ArgsDecoder<A> + 'static,
    {
        let decoders = Arc::make_mut(&mut self.decoders);
        decoders.insert(method.into(), Arc::new(decoder));
    }

    /// Register a method whose arguments deserialize into `T`, wrapped into
    /// `A` by `wrap`
    pub fn register_typed<T, F>(&mut self, method: impl Into<String>, wrap: F)
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) -> A + Send + Sync + 'static,
        A: 'static,
    {
        self.register(method, move |args: &RawValue| -> Result<A> {
            let typed: T = serde_json::from_str(args.get())?;
            Ok(wrap(typed))
        });
    }

    /// Register a method whose arguments are kept as a plain JSON object
    pub fn register_object(&mut self, method: impl Into<String>)
    where
        A: From<Map<String, Value>> + 'static,
    {
        self.register(method, |args: &RawValue| -> Result<A> {
            let object: Map<String, Value> = serde_json::from_str(args.get())?;
            Ok(A::from(object))
        });
    }

    /// Get the decoder for a method
    pub fn get(&self, method: &str) -> Option<Arc<dyn ArgsDecoder<A>>> {
        self.decoders.get(method).cloned()
    }

    /// Check if a method is registered
    pub fn contains(&self, method: &str) -> bool {
        self.decoders.contains_key(method)
    }

    /// Get all registered method names
    pub fn methods(&self) -> Vec<String> {
        self.decoders.keys().cloned().collect()
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Whether no method is registered
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Copy every decoder of `other` into this registry
    ///
    /// Entries of `other` replace entries with the same method name.
    pub fn merge(&mut self, other: &Registry<A>) {
        if other.is_empty() {
            return;
        }
        let decoders = Arc::make_mut(&mut self.decoders);
        for (method, decoder) in other.decoders.iter() {
            decoders.insert(method.clone(), Arc::clone(decoder));
        }
    }
}

impl<A> Clone for Registry<A> {
    fn clone(&self) -> Self {
        Self {
            decoders: Arc::clone(&self.decoders),
        }
    }
}

impl<A> Default for Registry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Registry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods = self.methods();
        methods.sort();
        f.debug_struct("Registry").field("methods", &methods).finish()
    }
}
