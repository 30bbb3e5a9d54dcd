//! JSON Pointer (RFC 6901) resolution over Rust values
//!
//! JMAP result references address a value inside an earlier method result
//! with a JSON Pointer. Rather than serializing the result back to JSON to
//! walk it, values that can be addressed implement [`Pointable`], a small
//! structural capability: look up a child by key, and turn the addressed
//! value into JSON.
//!
//! # Addressing Rules
//!
//! - **Maps** match the key exactly.
//! - **Sequences** take a non-negative base-10 index without leading zeros;
//!   an index past the end addresses nothing.
//! - **Records** declared with [`pointable_record!`] match the wire name
//!   first, then the Rust field name.
//! - **Leaves** (strings, numbers, ids, dates) have no children.
//!
//! The empty pointer addresses the root.
//!
//! # Examples
//!
//! ```rust
//! use jmap_core::pointer::get_json;
//! use serde_json::json;
//!
//! let doc = json!({"a/b": 1, "m~n": 8, "foo": ["bar", "baz"]});
//! assert_eq!(get_json("/a~1b", &doc).unwrap(), json!(1));
//! assert_eq!(get_json("/m~0n", &doc).unwrap(), json!(8));
//! assert_eq!(get_json("/foo/1", &doc).unwrap(), json!("baz"));
//! assert!(get_json("/foo/2", &doc).is_err());
//! ```

use crate::envelope::MethodResponse;
use crate::error::{Error, Result};
use crate::types::{Date, Id, Int, UnsignedInt, UtcDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::str::FromStr;

/// Parsed and validated JSON Pointer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPointer {
    text: String,
    tokens: Vec<String>,
}

impl JsonPointer {
    /// The empty pointer, addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse pointer text, failing with [`Error::InvalidPointerSyntax`] when
    /// it does not match the RFC 6901 grammar.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(Error::InvalidPointerSyntax(text.to_string()));
        };

        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '~' && !matches!(chars.next(), Some('0' | '1')) {
                return Err(Error::InvalidPointerSyntax(text.to_string()));
            }
        }

        let tokens = rest.split('/').map(unescape).collect();
        Ok(Self {
            text: text.to_string(),
            tokens,
        })
    }

    /// Append a reference token, escaping it as needed.
    pub fn join(mut self, token: &str) -> Self {
        self.text.push('/');
        self.text.push_str(&escape(token));
        self.tokens.push(token.to_string());
        self
    }

    /// Unescaped reference tokens
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether this is the empty pointer
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Pointer text as written
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for JsonPointer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// A value a JSON Pointer can walk into
pub trait Pointable {
    /// Child addressed by one reference token, if any.
    fn get(&self, key: &str) -> Option<&dyn Pointable>;

    /// The value as JSON.
    fn to_value(&self) -> Result<Value>;
}

/// Parse a sequence index token: `0` or a digit string without a leading
/// zero. `-` (one past the end) never addresses a value.
fn parse_index(key: &str) -> Option<usize> {
    let bytes = key.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    key.parse().ok()
}

impl Pointable for Value {
    fn get(&self, key: &str) -> Option<&dyn Pointable> {
        match self {
            Value::Object(map) => map.get(key).map(|v| v as &dyn Pointable),
            Value::Array(items) => Pointable::get(items.as_slice(), key),
            _ => None,
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(self.clone())
    }
}

impl Pointable for Map<String, Value> {
    fn get(&self, key: &str) -> Option<&dyn Pointable> {
        Map::get(self, key).map(|v| v as &dyn Pointable)
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Object(self.clone()))
    }
}

impl<K, T, S> Pointable for HashMap<K, T, S>
where
    K: Borrow<str> + Hash + Eq,
    T: Pointable,
    S: BuildHasher,
{
    fn get(&self, key: &str) -> Option<&dyn Pointable> {
        HashMap::get(self, key).map(|v| v as &dyn Pointable)
    }

    fn to_value(&self) -> Result<Value> {
        let mut map = Map::new();
        for (k, v) in self {
            map.insert(k.borrow().to_string(), v.to_value()?);
        }
        Ok(Value::Object(map))
    }
}

impl<K, T> Pointable for BTreeMap<K, T>
where
    K: Borrow<str> + Ord,
    T: Pointable,
{
    fn get(&self, key: &str) -> Option<&dyn Pointable> {
        BTreeMap::get(self, key).map(|v| v as &dyn Pointable)
    }

    fn to_value(&self) -> Result<Value> {
        let mut map = Map::new();
        for (k, v) in self {
            map.insert(k.borrow().to_string(), v.to_value()?);
        }
        Ok(Value::Object(map))
    }
}

impl<T: Pointable> Pointable for [T] {
    fn get(&self, key: &str) -> Option<&dyn Pointable> {
        let index = parse_index(key)?;
        <[T]>::get(self, index).map(|v| v as &dyn Pointable)
    }

    fn to_value(&self) -> Result<Value> {
        self.iter()
            .map(Pointable::to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
}

impl<T: Pointable> Pointable for Vec<T> {
    fn get(&self, key: &str) -> Option<&dyn Pointable> {
        Pointable::get(self.as_slice(), key)
    }

    fn to_value(&self) -> Result<Value> {
        self.as_slice().to_value()
    }
}

impl<T: Pointable> Pointable for Option<T> {
    fn get(&self, key: &str) -> Option<&dyn Pointable> {
        self.as_ref()?.get(key)
    }

    fn to_value(&self) -> Result<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: Pointable + ?Sized> Pointable for Box<T> {
    fn get(&self, key: &str) -> Option<&dyn Pointable> {
        (**self).get(key)
    }

    fn to_value(&self) -> Result<Value> {
        (**self).to_value()
    }
}

macro_rules! pointable_leaf {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Pointable for $ty {
                fn get(&self, _key: &str) -> Option<&dyn Pointable> {
                    None
                }

                fn to_value(&self) -> Result<Value> {
                    Ok(serde_json::to_value(self)?)
                }
            }
        )+
    };
}

pointable_leaf!(
    String, bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, Int, UnsignedInt, Id, Date,
    UtcDate,
);

/// Implement [`Pointable`] for a struct by listing its fields with their
/// wire names
///
/// Lookup tries the wire names first, then the Rust field names. Every
/// listed field must itself be `Pointable`.
///
/// # Examples
///
/// ```rust
/// use jmap_core::pointable_record;
/// use jmap_core::pointer::get_json;
/// use serde_json::json;
///
/// struct Thread {
///     id: String,
///     email_ids: Vec<String>,
/// }
///
/// pointable_record!(Thread {
///     id => "id",
///     email_ids => "emailIds",
/// });
///
/// let thread = Thread { id: "T1".into(), email_ids: vec!["M1".into(), "M2".into()] };
/// assert_eq!(get_json("/emailIds/1", &thread).unwrap(), json!("M2"));
/// assert_eq!(get_json("/email_ids/0", &thread).unwrap(), json!("M1"));
/// ```
#[macro_export]
macro_rules! pointable_record {
    ($ty:ty { $($field:ident => $wire:literal),+ $(,)? }) => {
        impl $crate::pointer::Pointable for $ty {
            fn get(&self, key: &str) -> ::std::option::Option<&dyn $crate::pointer::Pointable> {
                $(
                    if key == $wire {
                        return ::std::option::Option::Some(&self.$field);
                    }
                )+
                $(
                    if key == ::std::stringify!($field) {
                        return ::std::option::Option::Some(&self.$field);
                    }
                )+
                ::std::option::Option::None
            }

            fn to_value(&self) -> $crate::Result<$crate::__private::serde_json::Value> {
                let mut map = $crate::__private::serde_json::Map::new();
                $(
                    map.insert(
                        ::std::string::String::from($wire),
                        $crate::pointer::Pointable::to_value(&self.$field)?,
                    );
                )+
                ::std::result::Result::Ok($crate::__private::serde_json::Value::Object(map))
            }
        }
    };
}

/// Walk `root` along `pointer`
///
/// # Errors
///
/// Returns `Error::NoPointerValue` as soon as a token addresses nothing.
pub fn resolve<'a>(pointer: &JsonPointer, root: &'a dyn Pointable) -> Result<&'a dyn Pointable> {
    let mut current = root;
    for token in pointer.tokens() {
        current = current
            .get(token)
            .ok_or_else(|| Error::NoPointerValue(pointer.to_string()))?;
    }
    Ok(current)
}

/// Parse `path` and return the addressed value as JSON
///
/// # Errors
///
/// - `Error::InvalidPointerSyntax` if `path` is not a valid pointer
/// - `Error::NoPointerValue` if nothing lives at `path`
pub fn get_json(path: &str, root: &dyn Pointable) -> Result<Value> {
    let pointer = JsonPointer::parse(path)?;
    resolve(&pointer, root)?.to_value()
}

/// Reference to a value in the result of an earlier call in the same request
///
/// Sent in place of an argument as `"#argName": {"resultOf": ..., "name": ...,
/// "path": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReference {
    /// Call-id of the earlier call
    #[serde(rename = "resultOf")]
    pub result_of: String,
    /// Expected method name of the earlier result
    pub name: String,
    /// Pointer into the result's arguments
    pub path: JsonPointer,
}

impl ResultReference {
    /// Create a reference
    pub fn new(result_of: impl Into<String>, name: impl Into<String>, path: JsonPointer) -> Self {
        Self {
            result_of: result_of.into(),
            name: name.into(),
            path,
        }
    }

    /// Resolve against the results produced so far
    ///
    /// The first successful result whose call-id and name both match is
    /// used.
    ///
    /// # Errors
    ///
    /// - `Error::UnresolvedReference` if no result matches
    /// - `Error::NoPointerValue` if the path addresses nothing
    pub fn resolve<A: Pointable>(&self, responses: &[MethodResponse<A>]) -> Result<Value> {
        let invocation = responses
            .iter()
            .find_map(|r| match r {
                MethodResponse::Ok(inv)
                    if inv.call_id() == self.result_of && inv.name() == self.name =>
                {
                    Some(inv)
                }
                _ => None,
            })
            .ok_or_else(|| Error::UnresolvedReference(format!("{}/{}", self.result_of, self.name)))?;
        resolve(&self.path, invocation.args())?.to_value()
    }
}
