use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::url::{Url, UrlBuf};
use crate::{ContentKey, LanguageTag, MediaType};

/// A metadata dictionary. Keys are sorted, so serialization is stable.
pub type Dict<K = Arc<str>, V = Value> = BTreeMap<K, V>;

/// A metadata value: anything TOML, YAML, or JSON front matter can express.
///
/// Composite values are reference counted: cloning a `Value` never copies
/// the contents of an array or dictionary, and a clone can't be used to
/// mutate the original.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Num(Num),
    Float(f64),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Dict(Arc<Dict>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    pub fn to_num(&self) -> Option<Num> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None
        }
    }

    /// The value as a float, converting integers.
    pub fn to_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Num(n) => Some(n.to_f64()),
            _ => None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None
        }
    }

    pub fn into_str(self) -> Result<Arc<str>, Value> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self),
        }
    }

    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(v) => Some(&**v),
            _ => None
        }
    }

    /// The value at `path`, a `.`-separated list of dictionary keys.
    ///
    /// ```rust
    /// use prism::dict;
    /// use prism::value::Value;
    ///
    /// let value = Value::from(dict!["site" => dict!["title" => "Hi"]]);
    /// assert_eq!(value.lookup("site.title").and_then(|v| v.as_str()), Some("Hi"));
    /// assert!(value.lookup("site.author").is_none());
    /// assert!(value.lookup("site.title.len").is_none());
    /// ```
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |value, key| value.as_dict()?.get(key))
    }

    /// A short name for the kind of value, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dictionary",
        }
    }
}

macro_rules! impl_from_primitive {
    ($($T:ty),+ => $E:ident::$kind:ident) => {
        $(
            impl From<$T> for $E {
                fn from(value: $T) -> Self {
                    $E::$kind(value.into())
                }
            }
        )+
    };
}

impl_from_primitive!(bool => Value::Bool);
impl_from_primitive!(&str => Value::String);
impl_from_primitive!(String => Value::String);
impl_from_primitive!(Arc<str> => Value::String);
impl_from_primitive!(f32, f64 => Value::Float);
impl_from_primitive!(Arc<Vec<Value>> => Value::Array);
impl_from_primitive!(Arc<Dict> => Value::Dict);
impl_from_primitive!(u8, u16, u32, u64, usize => Value::Num);
impl_from_primitive!(i8, i16, i32, i64, isize => Value::Num);

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Value::from).unwrap_or(Value::Null)
    }
}

impl From<&Url> for Value {
    fn from(value: &Url) -> Self {
        Value::String(value.as_str().into())
    }
}

impl From<UrlBuf> for Value {
    fn from(value: UrlBuf) -> Self {
        Value::String(Url::into(value.into_arc_url()))
    }
}

impl From<&MediaType> for Value {
    fn from(value: &MediaType) -> Self {
        Value::String(value.as_str().into())
    }
}

impl From<&LanguageTag> for Value {
    fn from(value: &LanguageTag) -> Self {
        Value::String(value.as_str().into())
    }
}

impl From<&ContentKey> for Value {
    fn from(value: &ContentKey) -> Self {
        Value::String(value.as_str().into())
    }
}

/// As an RFC 3339 string.
impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::String(value.to_rfc3339().into())
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(value: Vec<T>) -> Self {
        value.into_iter().map(Value::from).collect()
    }
}

impl<K, V> From<Dict<K, V>> for Value where Arc<str>: From<K>, Value: From<V> {
    fn from(value: Dict<K, V>) -> Self {
        let dict = value.into_iter()
            .map(|(k, v)| (Arc::<str>::from(k), Value::from(v)))
            .collect::<Dict>();

        Value::Dict(Arc::new(dict))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Value::Array(Arc::new(iter.into_iter().collect()))
    }
}

/// An integer. Compares by numeric value regardless of variant.
///
/// ```rust
/// use prism::value::Num;
///
/// assert_eq!(Num::from(10i32), Num::from(10u64));
/// assert!(Num::from(-1i8) < Num::from(0u8));
/// assert!(Num::from(u64::MAX) > Num::from(i64::MAX));
/// assert!(Num::from(-2i64) > Num::from(-3i64));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Num {
    UInt(u64),
    Int(i64),
}

impl Num {
    fn widen(self) -> i128 {
        match self {
            Num::UInt(v) => v as i128,
            Num::Int(v) => v as i128,
        }
    }

    pub fn to_i64(self) -> Option<i64> {
        self.widen().try_into().ok()
    }

    pub fn to_u64(self) -> Option<u64> {
        self.widen().try_into().ok()
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Num::UInt(v) => v as f64,
            Num::Int(v) => v as f64,
        }
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        self.widen() == other.widen()
    }
}

impl Eq for Num { }

impl Hash for Num {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.widen().hash(state)
    }
}

impl PartialOrd for Num {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Num {
    fn cmp(&self, other: &Self) -> Ordering {
        self.widen().cmp(&other.widen())
    }
}

macro_rules! impl_from_for_num {
    ($($T:ty => $V:ident),* $(,)?) => ($(
        impl From<$T> for Num {
            fn from(value: $T) -> Num {
                Num::$V(value as _)
            }
        }
    )*)
}

impl_from_for_num! {
    u8 => UInt, u16 => UInt, u32 => UInt, u64 => UInt, usize => UInt,
    i8 => Int, i16 => Int, i32 => Int, i64 => Int, isize => Int,
}

macro_rules! impl_try_from_value {
    ($($T:ty),+ => | $v:ident | $e:expr) => {
        $(
            impl TryFrom<Value> for $T {
                type Error = Value;

                fn try_from($v: Value) -> Result<Self, Self::Error> {
                    $e
                }
            }
        )+
    };
}

impl_try_from_value!(bool => |v| v.to_bool().ok_or(v));
impl_try_from_value!(Arc<str> => |v| v.into_str());
impl_try_from_value!(String => |v| v.into_str().map(|s| s.to_string()));
impl_try_from_value!(f64 => |v| v.to_float().ok_or(v));
impl_try_from_value!(Num => |v| v.to_num().ok_or(v));
impl_try_from_value!(u8, u16, u32, u64, usize =>
    |v| v.to_num().and_then(|n| n.widen().try_into().ok()).ok_or(v));
impl_try_from_value!(i8, i16, i32, i64, isize =>
    |v| v.to_num().and_then(|n| n.widen().try_into().ok()).ok_or(v));

impl<T: TryFrom<Value, Error = Value>> TryFrom<Value> for Vec<T> {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(array) => array.iter().cloned().map(T::try_from).collect(),
            value => Err(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Format, Json};

    #[test]
    fn integers_round_trip_signs() {
        let value: Value = Json::read("[-5, 5, 18446744073709551615]").unwrap();
        let nums: Vec<Num> = value.try_into().unwrap();
        assert_eq!(nums, [Num::Int(-5), Num::UInt(5), Num::UInt(u64::MAX)]);

        assert_eq!(i8::try_from(Value::from(-5)).unwrap(), -5);
        assert!(u8::try_from(Value::from(-5)).is_err());
        assert!(i64::try_from(Value::from(u64::MAX)).is_err());
        assert_eq!(Num::from(u64::MAX).to_i64(), None);
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(vec!["a", "b"]).as_slice().map(|s| s.len()), Some(2));
        assert_eq!(Value::from(3).to_float(), Some(3.0));
        assert_eq!(f64::try_from(Value::from("x")), Err(Value::from("x")));

        let time = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        assert_eq!(Value::from(time).as_str(), Some("1970-01-01T00:00:00+00:00"));
    }
}
