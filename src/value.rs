//! Value types that facts can hold.
//!
//! A fact value is a closed tagged union over scalars, arrays and maps.
//! Values are immutable once constructed; typed access goes through
//! [`Value::as_type`], which yields `None` instead of coercing when the
//! stored tag does not match the requested type.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Possible values a fact can hold.
///
/// # Examples
///
/// ```
/// use facter::Value;
///
/// let release = Value::from("12.4");
/// let cores = Value::from(8);
///
/// assert_eq!(release.as_type::<&str>(), Some("12.4"));
/// assert_eq!(cores.as_type::<i64>(), Some(8));
/// assert_eq!(cores.as_type::<&str>(), None);
/// ```
///
/// Non-finite doubles have no JSON representation; every output format and
/// [`fmt::Display`] render them as the strings `NaN`, `Infinity` and
/// `-Infinity`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// `true` or `false`.
    Boolean(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 text.
    String(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// String-keyed mapping, kept in key order.
    Map(BTreeMap<String, Value>),
}

/// The tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ValueKind {
    Boolean,
    Integer,
    Double,
    String,
    Array,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
            Self::Array => "array",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Returns the tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Double(_) => ValueKind::Double,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Map(_) => ValueKind::Map,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Returns true for a boolean.
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean(_))
    }

    /// Returns true for an integer.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Integer(_))
    }

    /// Returns true for a double.
    #[must_use]
    pub const fn is_double(&self) -> bool {
        matches!(self, Self::Double(_))
    }

    /// Returns true for a string.
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns true for an array.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns true for a map.
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// The boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer payload, if any.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Strict: an integer value is not returned as a double.
    #[must_use]
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// The array payload, if any.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    /// The map payload, if any.
    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Type-checked access to the payload.
    ///
    /// Returns `None` when the stored tag does not match `T`; no conversion
    /// between tags is ever attempted.
    #[must_use]
    pub fn as_type<'a, T: FromValue<'a>>(&'a self) -> Option<T> {
        T::from_value(self)
    }

    /// Looks up a key in a map value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Converts a JSON document into a fact value.
    ///
    /// `null` has no fact representation: a top-level null yields `None` and
    /// nulls nested in arrays or objects are dropped. Integers outside the
    /// `i64` range become doubles.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(v) => Some(Self::Boolean(v)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                None => n.as_f64().map(Self::Double),
            },
            serde_json::Value::String(s) => Some(Self::String(s)),
            serde_json::Value::Array(items) => Some(Self::Array(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            serde_json::Value::Object(entries) => Some(Self::Map(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }
}

/// Types that can be borrowed out of a [`Value`] by tag.
pub trait FromValue<'a>: Sized {
    /// Returns the payload if `value` carries the matching tag.
    fn from_value(value: &'a Value) -> Option<Self>;
}

impl<'a> FromValue<'a> for bool {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_bool()
    }
}

impl<'a> FromValue<'a> for i64 {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_integer()
    }
}

impl<'a> FromValue<'a> for f64 {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_double()
    }
}

impl<'a> FromValue<'a> for &'a str {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_str()
    }
}

impl<'a> FromValue<'a> for &'a [Value] {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_array()
    }
}

impl<'a> FromValue<'a> for &'a BTreeMap<String, Value> {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_map()
    }
}

impl<'a> FromValue<'a> for &'a Value {
    fn from_value(value: &'a Value) -> Option<Self> {
        Some(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Boolean(v) => serializer.serialize_bool(*v),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Double(v) => match non_finite_name(*v) {
                Some(name) => serializer.serialize_str(name),
                None => serializer.serialize_f64(*v),
            },
            Self::String(v) => serializer.serialize_str(v),
            Self::Array(items) => serializer.collect_seq(items),
            Self::Map(entries) => serializer.collect_map(entries),
        }
    }
}

/// Textual form of a non-finite double; `None` for finite values.
pub(crate) fn non_finite_name(v: f64) -> Option<&'static str> {
    if v.is_nan() {
        Some("NaN")
    } else if v.is_infinite() {
        Some(if v > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        None
    }
}

/// Scalars render in their natural form (strings unquoted); arrays and maps
/// render as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Double(v) => match non_finite_name(*v) {
                Some(name) => f.write_str(name),
                None => write!(f, "{v}"),
            },
            Self::String(v) => f.write_str(v),
            Self::Array(_) | Self::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

/// Values beyond `i64::MAX` become doubles.
impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Self::Integer(i),
            #[allow(clippy::cast_precision_loss)]
            Err(_) => Self::Double(v as f64),
        }
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::from(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
