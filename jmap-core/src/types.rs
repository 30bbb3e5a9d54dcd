//! Constrained base types of the JMAP data model
//!
//! JMAP narrows several JSON primitives: integers must be exactly
//! representable as IEEE 754 doubles, identifiers are restricted to the
//! URL-safe base64 alphabet and dates are RFC 3339 strings. The wrappers in
//! this module carry those constraints and check them at the serialization
//! boundary, so an invalid value can be *held* but never encoded or decoded.
//!
//! # Validation Strategy
//!
//! - **Encoding** fails with a distinguished error instead of clamping or
//!   truncating the value.
//! - **Decoding** parses the underlying primitive first and then re-validates
//!   it, so a well-formed but out-of-range number is reported as out of range
//!   rather than as a syntax error.
//!
//! # Examples
//!
//! ```rust
//! use jmap_core::{Id, Int};
//!
//! assert!(serde_json::to_string(&Int(2 << 54)).is_err());
//! assert_eq!(serde_json::to_string(&Int(2 << 50)).unwrap(), "2251799813685248");
//!
//! let id = Id::random().unwrap();
//! assert!(id.valid() && id.safe());
//! ```

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{self, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

/// Largest magnitude an `Int` or `UnsignedInt` may hold (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Signed integer in the range -2^53+1 <= value <= 2^53-1
///
/// # Examples
///
/// ```rust
/// use jmap_core::Int;
///
/// assert!(Int(-(2 << 50)).valid());
/// assert!(!Int(2 << 54).valid());
/// assert!(Int::new(1 << 60).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Int(pub i64);

impl Int {
    /// Wrap `value`, failing with [`Error::OutOfRange`] when it is not
    /// representable.
    pub fn new(value: i64) -> Result<Self> {
        let int = Int(value);
        if int.valid() {
            Ok(int)
        } else {
            Err(Error::OutOfRange)
        }
    }

    /// Whether the value is within the allowed range.
    pub fn valid(&self) -> bool {
        (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&self.0)
    }
}

impl Serialize for Int {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if !self.valid() {
            return Err(ser::Error::custom(Error::OutOfRange));
        }
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Int {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        Int::new(value).map_err(de::Error::custom)
    }
}

impl From<Int> for i64 {
    fn from(value: Int) -> Self {
        value.0
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unsigned integer in the range 0 <= value <= 2^53-1
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnsignedInt(pub u64);

impl UnsignedInt {
    /// Wrap `value`, failing with [`Error::OutOfRange`] when it is not
    /// representable.
    pub fn new(value: u64) -> Result<Self> {
        let int = UnsignedInt(value);
        if int.valid() {
            Ok(int)
        } else {
            Err(Error::OutOfRange)
        }
    }

    /// Whether the value is within the allowed range.
    pub fn valid(&self) -> bool {
        self.0 <= MAX_SAFE_INTEGER as u64
    }
}

impl Serialize for UnsignedInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if !self.valid() {
            return Err(ser::Error::custom(Error::OutOfRange));
        }
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for UnsignedInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = u64::deserialize(deserializer)?;
        UnsignedInt::new(value).map_err(de::Error::custom)
    }
}

impl From<UnsignedInt> for u64 {
    fn from(value: UnsignedInt) -> Self {
        value.0
    }
}

impl fmt::Display for UnsignedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Timestamp serialized as RFC 3339 text without fractional seconds
///
/// The original offset is preserved in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(pub DateTime<FixedOffset>);

impl Date {
    /// Parse RFC 3339 text.
    pub fn parse(s: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(s)
            .map(Date)
            .map_err(|e| Error::InvalidDate(format!("{s:?}: {e}")))
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl From<DateTime<FixedOffset>> for Date {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Date(value)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s).map_err(de::Error::custom)
    }
}

/// Timestamp always serialized in UTC
///
/// A value holding another offset is converted to UTC when encoded. Decoding
/// only accepts text whose offset is written as `Z`.
///
/// # Examples
///
/// ```rust
/// use jmap_core::UtcDate;
///
/// let d = UtcDate::parse("2014-10-30T14:12:00Z").unwrap();
/// assert_eq!(d.to_string(), "2014-10-30T14:12:00Z");
/// assert!(UtcDate::parse("2014-10-30T06:12:00-08:00").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDate(pub DateTime<FixedOffset>);

impl UtcDate {
    /// Current time.
    pub fn now() -> Self {
        UtcDate(Utc::now().fixed_offset())
    }

    /// Parse RFC 3339 text whose offset is UTC.
    ///
    /// `Z` and `+00:00` are accepted. `-00:00` means the offset is unknown
    /// (RFC 3339 section 4.3) and is rejected like any non-zero offset.
    pub fn parse(s: &str) -> Result<Self> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|e| Error::InvalidDate(format!("{s:?}: {e}")))?;
        if parsed.offset().local_minus_utc() != 0 || s.ends_with("-00:00") {
            return Err(Error::NotUtc(s.to_string()));
        }
        Ok(UtcDate(parsed))
    }

    /// The instant in UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }
}

impl fmt::Display for UtcDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl From<DateTime<Utc>> for UtcDate {
    fn from(value: DateTime<Utc>) -> Self {
        UtcDate(value.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for UtcDate {
    fn from(value: DateTime<FixedOffset>) -> Self {
        UtcDate(value)
    }
}

impl Serialize for UtcDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UtcDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        UtcDate::parse(&s).map_err(de::Error::custom)
    }
}

/// Opaque identifier of 1 to 255 octets
///
/// Only characters from the "URL and Filename safe" base64 alphabet of
/// RFC 4648 are allowed (ASCII alphanumerics, hyphen and underscore), without
/// padding.
///
/// Construction through `From` does not validate, so ids received from
/// elsewhere can be inspected with [`Id::valid`]. Serialization and
/// [`Id::new`] do validate.
///
/// # Examples
///
/// ```rust
/// use jmap_core::Id;
///
/// assert!(Id::from("iamValid0_-").valid());
/// assert!(!Id::from("i'mnot0").valid());
/// assert!(!Id::from("0aaa").safe());
/// assert!(Id::new("").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(String);

impl Id {
    /// Create an id, failing with [`Error::InvalidId`] when it is not valid.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = Id(id.into());
        if id.valid() {
            Ok(id)
        } else {
            Err(Error::InvalidId(id.0))
        }
    }

    /// Generate a random id that is both valid and safe.
    ///
    /// Draws 32 bytes from the operating system source and hex-encodes them,
    /// retrying until the result is safe.
    pub fn random() -> Result<Self> {
        let mut buf = [0u8; 32];
        loop {
            OsRng
                .try_fill_bytes(&mut buf)
                .map_err(|e| Error::Entropy(e.to_string()))?;
            let id = Id(hex::encode(buf));
            if id.valid() && id.safe() {
                return Ok(id);
            }
        }
    }

    /// Whether the id has a valid length and alphabet.
    pub fn valid(&self) -> bool {
        (1..=255).contains(&self.0.len())
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    /// Whether the id can be used in file names, URLs and the like without
    /// escaping.
    ///
    /// A safe id is valid, does not start with a hyphen or a digit, is not
    /// made only of digits and is not `NIL`.
    pub fn safe(&self) -> bool {
        if !self.valid() {
            return false;
        }
        let bytes = self.0.as_bytes();
        if bytes[0] == b'-' || bytes[0].is_ascii_digit() {
            return false;
        }
        if bytes.iter().all(u8::is_ascii_digit) {
            return false;
        }
        self.0 != "NIL"
    }

    /// Borrow the id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the id text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id(s.to_string())
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if !self.valid() {
            return Err(ser::Error::custom(Error::InvalidId(self.0.clone())));
        }
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Id::new(s).map_err(de::Error::custom)
    }
}
