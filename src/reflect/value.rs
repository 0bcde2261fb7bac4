use super::shape::{BlobKind, NumberKind, Shape, StructShape};
use crate::error::ConversionFailure;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::IntErrorKind;

/// A number tagged with its exact width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
}

impl Number {
    #[must_use]
    pub fn kind(&self) -> NumberKind {
        match self {
            Number::I8(_) => NumberKind::I8,
            Number::I16(_) => NumberKind::I16,
            Number::I32(_) => NumberKind::I32,
            Number::I64(_) => NumberKind::I64,
            Number::Isize(_) => NumberKind::Isize,
            Number::U8(_) => NumberKind::U8,
            Number::U16(_) => NumberKind::U16,
            Number::U32(_) => NumberKind::U32,
            Number::U64(_) => NumberKind::U64,
            Number::Usize(_) => NumberKind::Usize,
            Number::F32(_) => NumberKind::F32,
            Number::F64(_) => NumberKind::F64,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        match *self {
            Number::F32(f) => f == 0.0,
            Number::F64(f) => f == 0.0,
            _ => self.as_i128() == Some(0),
        }
    }

    /// Integer view; `None` for floats.
    fn as_i128(&self) -> Option<i128> {
        Some(match *self {
            Number::I8(n) => i128::from(n),
            Number::I16(n) => i128::from(n),
            Number::I32(n) => i128::from(n),
            Number::I64(n) => i128::from(n),
            Number::Isize(n) => n as i128,
            Number::U8(n) => i128::from(n),
            Number::U16(n) => i128::from(n),
            Number::U32(n) => i128::from(n),
            Number::U64(n) => i128::from(n),
            Number::Usize(n) => n as i128,
            Number::F32(_) | Number::F64(_) => return None,
        })
    }

    fn as_f64(&self) -> f64 {
        match *self {
            Number::F32(f) => f64::from(f),
            Number::F64(f) => f,
            _ => self.as_i128().unwrap_or_default() as f64,
        }
    }

    fn from_i128(n: i128, kind: NumberKind) -> Option<Number> {
        Some(match kind {
            NumberKind::I8 => Number::I8(i8::try_from(n).ok()?),
            NumberKind::I16 => Number::I16(i16::try_from(n).ok()?),
            NumberKind::I32 => Number::I32(i32::try_from(n).ok()?),
            NumberKind::I64 => Number::I64(i64::try_from(n).ok()?),
            NumberKind::Isize => Number::Isize(isize::try_from(n).ok()?),
            NumberKind::U8 => Number::U8(u8::try_from(n).ok()?),
            NumberKind::U16 => Number::U16(u16::try_from(n).ok()?),
            NumberKind::U32 => Number::U32(u32::try_from(n).ok()?),
            NumberKind::U64 => Number::U64(u64::try_from(n).ok()?),
            NumberKind::Usize => Number::Usize(usize::try_from(n).ok()?),
            NumberKind::F32 => Number::F32(n as f32),
            NumberKind::F64 => Number::F64(n as f64),
        })
    }

    /// Parse `text` as a number of the given width.
    ///
    /// Integers accept an optional sign and a `0x`, `0o` or `0b` prefix. A
    /// leading zero alone does not switch to octal.
    pub fn parse(text: &str, kind: NumberKind) -> Result<Number, ConversionFailure> {
        if kind.is_float() {
            let parsed: f64 = text
                .parse()
                .map_err(|_| ConversionFailure::Parse(text.to_string()))?;
            if parsed.is_infinite() && !is_infinity_literal(text) {
                return Err(ConversionFailure::Overflow(text.to_string()));
            }
            return Number::F64(parsed).cast(kind);
        }
        let wide = parse_integer(text)?;
        Number::from_i128(wide, kind).ok_or_else(|| ConversionFailure::Overflow(text.to_string()))
    }

    /// Convert to another width, failing instead of truncating.
    ///
    /// Floats only convert to integers when they carry no fraction.
    pub fn cast(self, kind: NumberKind) -> Result<Number, ConversionFailure> {
        let overflow = || ConversionFailure::Overflow(self.to_string());
        match kind {
            NumberKind::F64 => return Ok(Number::F64(self.as_f64())),
            NumberKind::F32 => {
                let wide = self.as_f64();
                let narrow = wide as f32;
                if narrow.is_infinite() && wide.is_finite() {
                    return Err(overflow());
                }
                return Ok(Number::F32(narrow));
            }
            _ => {}
        }
        let wide = match self.as_i128() {
            Some(n) => n,
            None => {
                let f = self.as_f64();
                if !f.is_finite() || f.fract() != 0.0 {
                    return Err(overflow());
                }
                f as i128
            }
        };
        Number::from_i128(wide, kind).ok_or_else(overflow)
    }

    fn to_json(self) -> serde_json::Value {
        match self {
            Number::I8(n) => n.into(),
            Number::I16(n) => n.into(),
            Number::I32(n) => n.into(),
            Number::I64(n) => n.into(),
            Number::Isize(n) => n.into(),
            Number::U8(n) => n.into(),
            Number::U16(n) => n.into(),
            Number::U32(n) => n.into(),
            Number::U64(n) => n.into(),
            Number::Usize(n) => n.into(),
            Number::F32(f) => serde_json::Number::from_f64(f64::from(f))
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Number::F64(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
        }
    }

    fn from_json(n: &serde_json::Number) -> Number {
        if let Some(i) = n.as_i64() {
            Number::I64(i)
        } else if let Some(u) = n.as_u64() {
            Number::U64(u)
        } else {
            Number::F64(n.as_f64().unwrap_or_default())
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I8(n) => n.fmt(f),
            Number::I16(n) => n.fmt(f),
            Number::I32(n) => n.fmt(f),
            Number::I64(n) => n.fmt(f),
            Number::Isize(n) => n.fmt(f),
            Number::U8(n) => n.fmt(f),
            Number::U16(n) => n.fmt(f),
            Number::U32(n) => n.fmt(f),
            Number::U64(n) => n.fmt(f),
            Number::Usize(n) => n.fmt(f),
            Number::F32(n) => n.fmt(f),
            Number::F64(n) => n.fmt(f),
        }
    }
}

fn is_infinity_literal(text: &str) -> bool {
    let unsigned = text.trim_start_matches(['+', '-']).to_ascii_lowercase();
    unsigned == "inf" || unsigned == "infinity"
}

fn parse_integer(text: &str) -> Result<i128, ConversionFailure> {
    let invalid = || ConversionFailure::Parse(text.to_string());
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        Some("0o" | "0O") => (8, &rest[2..]),
        Some("0b" | "0B") => (2, &rest[2..]),
        _ => (10, rest),
    };
    // from_str_radix would accept a second sign
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid());
    }
    let magnitude = i128::from_str_radix(digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ConversionFailure::Overflow(text.to_string())
        }
        _ => invalid(),
    })?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// A dynamically shaped value.
///
/// Composite variants carry their element shapes so that an empty list or an
/// absent optional still reports the exact shape it was produced from.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(Number),
    Str(String),
    Optional {
        elem: Shape,
        inner: Option<Box<Value>>,
    },
    List {
        elem: Shape,
        items: Vec<Value>,
    },
    Array {
        len: usize,
        elem: Shape,
        items: Vec<Value>,
    },
    Map {
        key: Shape,
        value: Shape,
        entries: Vec<(Value, Value)>,
    },
    /// A serde struct, carried as its JSON tree
    Record {
        shape: StructShape,
        data: serde_json::Value,
    },
    Blob(BlobKind, Vec<u8>),
    Failure(String),
}

/// The absent dynamic value, what JSON `null` reads as.
impl Default for Value {
    fn default() -> Self {
        Value::Optional {
            elem: Shape::Dynamic,
            inner: None,
        }
    }
}

impl Value {
    /// A list of strings, the shape every header and query value arrives in.
    pub fn strings<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List {
            elem: Shape::Str,
            items: items.into_iter().map(|s| Value::Str(s.into())).collect(),
        }
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Value::Bool(_) => Shape::Bool,
            Value::Number(n) => Shape::Number(n.kind()),
            Value::Str(_) => Shape::Str,
            Value::Optional { elem, .. } => Shape::optional(elem.clone()),
            Value::List { elem, .. } => Shape::list(elem.clone()),
            Value::Array { len, elem, .. } => Shape::array(*len, elem.clone()),
            Value::Map { key, value, .. } => Shape::map(key.clone(), value.clone()),
            Value::Record { shape, .. } => Shape::Struct(shape.clone()),
            Value::Blob(kind, _) => Shape::Blob(*kind),
            Value::Failure(_) => Shape::Failure,
        }
    }

    #[must_use]
    pub fn identity(&self) -> String {
        self.shape().identity()
    }

    /// Zero-ness as the response writer sees it. A failure is never zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::Number(n) => n.is_zero(),
            Value::Str(s) => s.is_empty(),
            Value::Optional { inner, .. } => inner.is_none(),
            Value::List { items, .. } => items.is_empty(),
            Value::Array { items, .. } => items.iter().all(Value::is_zero),
            Value::Map { entries, .. } => entries.is_empty(),
            Value::Record { data, .. } => json_is_zero(data),
            Value::Blob(_, bytes) => bytes.is_empty(),
            Value::Failure(_) => false,
        }
    }

    /// Human readable rendering used by `text` bodies and header values.
    #[must_use]
    pub fn render_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Failure(message) => message.clone(),
            Value::Optional { inner, .. } => {
                inner.as_ref().map(|v| v.render_text()).unwrap_or_default()
            }
            Value::Blob(_, bytes) => String::from_utf8_lossy(bytes).into_owned(),
            other => other.to_json().to_string(),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => n.to_json(),
            Value::Str(s) => Json::String(s.clone()),
            Value::Optional { inner, .. } => inner.as_ref().map_or(Json::Null, |v| v.to_json()),
            Value::List { items, .. } | Value::Array { items, .. } => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map { entries, .. } => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.render_text(), v.to_json()))
                    .collect(),
            ),
            Value::Record { data, .. } => data.clone(),
            Value::Blob(BlobKind::Json, bytes) => serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Json::String(String::from_utf8_lossy(bytes).into_owned())),
            Value::Blob(BlobKind::Xml, bytes) => {
                Json::String(String::from_utf8_lossy(bytes).into_owned())
            }
            Value::Failure(message) => Json::String(message.clone()),
        }
    }

    /// Inverse of [`Value::to_json`] as far as JSON can tell: arrays become
    /// dynamic lists and objects become string-keyed dynamic maps.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Value {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Optional {
                elem: Shape::Dynamic,
                inner: None,
            },
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(Number::from_json(&n)),
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List {
                elem: Shape::Dynamic,
                items: items.into_iter().map(Value::from_json).collect(),
            },
            Json::Object(map) => Value::Map {
                key: Shape::Str,
                value: Shape::Dynamic,
                entries: map
                    .into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from_json(v)))
                    .collect(),
            },
        }
    }
}

pub(crate) fn json_is_zero(json: &serde_json::Value) -> bool {
    use serde_json::Value as Json;
    match json {
        Json::Null => true,
        Json::Bool(b) => !b,
        Json::Number(n) => n.as_f64() == Some(0.0),
        Json::String(s) => s.is_empty(),
        Json::Array(items) => items.is_empty(),
        Json::Object(map) => map.values().all(json_is_zero),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}
