use super::shape::{BlobKind, NumberKind, Shape, StructShape};
use super::value::{json_is_zero, Number, Value};
use crate::error::{ConversionError, ConversionFailure};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

/// A type the conversion engine can read and construct.
///
/// `from_value` receives a value that the registry has already coerced to
/// `Self::shape()`; anything else is reported as
/// [`ConversionFailure::Unexpected`].
pub trait Reflect: Sized {
    fn shape() -> Shape;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ConversionError>;

    fn is_zero(&self) -> bool {
        self.to_value().is_zero()
    }
}

fn unexpected<T: Reflect>(value: &Value) -> ConversionError {
    ConversionError::new(&value.shape(), &T::shape(), ConversionFailure::Unexpected)
}

impl Reflect for bool {
    fn shape() -> Shape {
        Shape::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

macro_rules! reflect_number {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Reflect for $ty {
            fn shape() -> Shape {
                Shape::Number(NumberKind::$kind)
            }

            fn to_value(&self) -> Value {
                Value::Number(Number::$kind(*self))
            }

            fn from_value(value: Value) -> Result<Self, ConversionError> {
                match value {
                    Value::Number(Number::$kind(n)) => Ok(n),
                    other => Err(unexpected::<Self>(&other)),
                }
            }

            fn is_zero(&self) -> bool {
                Number::$kind(*self).is_zero()
            }
        }
    )*};
}

reflect_number! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize,
    f32 => F32, f64 => F64,
}

impl Reflect for String {
    fn shape() -> Shape {
        Shape::Str
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::optional(T::shape())
    }

    fn to_value(&self) -> Value {
        Value::Optional {
            elem: T::shape(),
            inner: self.as_ref().map(|v| Box::new(v.to_value())),
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Optional { inner: None, .. } => Ok(None),
            Value::Optional { inner: Some(v), .. } => T::from_value(*v).map(Some),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn shape() -> Shape {
        Shape::list(T::shape())
    }

    fn to_value(&self) -> Value {
        Value::List {
            elem: T::shape(),
            items: self.iter().map(Reflect::to_value).collect(),
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::List { items, .. } => items.into_iter().map(T::from_value).collect(),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Fixed-size arrays fill from the front; positions past the source length
/// keep their default.
impl<T: Reflect + Default, const N: usize> Reflect for [T; N] {
    fn shape() -> Shape {
        Shape::array(N, T::shape())
    }

    fn to_value(&self) -> Value {
        Value::Array {
            len: N,
            elem: T::shape(),
            items: self.iter().map(Reflect::to_value).collect(),
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let items = match value {
            Value::Array { items, .. } => items,
            other => return Err(unexpected::<Self>(&other)),
        };
        let capacity_error = |len| {
            ConversionError::new(
                &Shape::array(len, T::shape()),
                &Self::shape(),
                ConversionFailure::Capacity { len, capacity: N },
            )
        };
        if items.len() > N {
            return Err(capacity_error(items.len()));
        }
        let mut out = items
            .into_iter()
            .map(T::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        out.resize_with(N, T::default);
        out.try_into().map_err(|v: Vec<T>| capacity_error(v.len()))
    }

    fn is_zero(&self) -> bool {
        self.iter().all(Reflect::is_zero)
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn shape() -> Shape {
        Shape::map(K::shape(), V::shape())
    }

    fn to_value(&self) -> Value {
        Value::Map {
            key: K::shape(),
            value: V::shape(),
            entries: self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect(),
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Map { entries, .. } => entries
                .into_iter()
                .map(|(k, v)| -> Result<(K, V), ConversionError> {
                    Ok((K::from_value(k)?, V::from_value(v)?))
                })
                .collect(),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::map(K::shape(), V::shape())
    }

    fn to_value(&self) -> Value {
        Value::Map {
            key: K::shape(),
            value: V::shape(),
            entries: self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect(),
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Map { entries, .. } => entries
                .into_iter()
                .map(|(k, v)| -> Result<(K, V), ConversionError> {
                    Ok((K::from_value(k)?, V::from_value(v)?))
                })
                .collect(),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// `Value` is the dynamic destination: it accepts anything as is.
impl Reflect for Value {
    fn shape() -> Shape {
        Shape::Dynamic
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }

    fn is_zero(&self) -> bool {
        Value::is_zero(self)
    }
}

/// An error carried in a response field.
///
/// Response fields of this type default to the error status code. Any
/// `std::error::Error` converts into it with `?` or `.into()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure(String);

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<E: std::error::Error> From<E> for Failure {
    fn from(err: E) -> Self {
        Self(err.to_string())
    }
}

impl Serialize for Failure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Failure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Failure)
    }
}

impl Reflect for Failure {
    fn shape() -> Shape {
        Shape::Failure
    }

    fn to_value(&self) -> Value {
        Value::Failure(self.0.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Failure(message) | Value::Str(message) => Ok(Failure(message)),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        false
    }
}

/// An undecoded JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawJson(pub Vec<u8>);

impl Serialize for RawJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tree: serde_json::Value =
            serde_json::from_slice(&self.0).map_err(serde::ser::Error::custom)?;
        tree.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tree = serde_json::Value::deserialize(deserializer)?;
        serde_json::to_vec(&tree)
            .map(RawJson)
            .map_err(serde::de::Error::custom)
    }
}

impl Reflect for RawJson {
    fn shape() -> Shape {
        Shape::Blob(BlobKind::Json)
    }

    fn to_value(&self) -> Value {
        Value::Blob(BlobKind::Json, self.0.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Blob(BlobKind::Json, bytes) => Ok(RawJson(bytes)),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

/// An undecoded XML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawXml(pub Vec<u8>);

impl Serialize for RawXml {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(&self.0))
    }
}

impl<'de> Deserialize<'de> for RawXml {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| RawXml(s.into_bytes()))
    }
}

impl Reflect for RawXml {
    fn shape() -> Shape {
        Shape::Blob(BlobKind::Xml)
    }

    fn to_value(&self) -> Value {
        Value::Blob(BlobKind::Xml, self.0.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Blob(BlobKind::Xml, bytes) => Ok(RawXml(bytes)),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

// Record support, used by `#[derive(Record)]`.

/// Named struct shape for a serde record type.
#[must_use]
pub fn record_shape<T: ?Sized>() -> Shape {
    Shape::Struct(StructShape::named(std::any::type_name::<T>()))
}

pub fn record_to_value<T: Serialize>(record: &T) -> Value {
    Value::Record {
        shape: StructShape::named(std::any::type_name::<T>()),
        data: serde_json::to_value(record).unwrap_or(serde_json::Value::Null),
    }
}

pub fn record_from_value<T: DeserializeOwned>(value: Value) -> Result<T, ConversionError> {
    match value {
        Value::Record { shape, data } => serde_json::from_value(data).map_err(|e| {
            ConversionError::new(
                &Shape::Struct(shape),
                &record_shape::<T>(),
                ConversionFailure::Decode(e.to_string()),
            )
        }),
        other => Err(ConversionError::new(
            &other.shape(),
            &record_shape::<T>(),
            ConversionFailure::Unexpected,
        )),
    }
}

/// A record is zero when every field serializes to its zero value.
pub fn record_is_zero<T: Serialize>(record: &T) -> bool {
    serde_json::to_value(record).is_ok_and(|data| json_is_zero(&data))
}
