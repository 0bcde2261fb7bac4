use super::registry::ConversionRegistry;
use crate::error::{ConversionError, ConversionFailure};
use crate::reflect::{BlobKind, Kind, Number, Shape, Value};
use std::sync::Arc;

/// One coercion strategy.
///
/// A rule is consulted when the source and destination shapes differ. The
/// registry asks each rule in order whether it [`accepts`](Self::accepts) the
/// pair and runs the first one that does. Rules that need to convert nested
/// values (elements, entries) call back into the registry.
pub trait ConversionRule: Send + Sync {
    fn name(&self) -> &str;

    fn accepts(&self, from: &Shape, to: &Shape) -> bool;

    /// Produce a value whose shape is exactly `to`.
    fn convert(
        &self,
        registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError>;
}

fn unexpected(value: &Value, to: &Shape) -> ConversionError {
    ConversionError::new(&value.shape(), to, ConversionFailure::Unexpected)
}

/// Textual numbers into any integer or float width.
pub struct StrToNumber;

impl ConversionRule for StrToNumber {
    fn name(&self) -> &str {
        "string->number"
    }

    fn accepts(&self, from: &Shape, to: &Shape) -> bool {
        from.kind() == Kind::String && to.kind() == Kind::Number
    }

    fn convert(
        &self,
        _registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError> {
        match (&value, to) {
            (Value::Str(text), Shape::Number(kind)) => Number::parse(text, *kind)
                .map(Value::Number)
                .map_err(|reason| ConversionError::new(&Shape::Str, to, reason)),
            _ => Err(unexpected(&value, to)),
        }
    }
}

/// `1 t T TRUE true True` and `0 f F FALSE false False`.
pub struct StrToBool;

impl ConversionRule for StrToBool {
    fn name(&self) -> &str {
        "string->bool"
    }

    fn accepts(&self, from: &Shape, to: &Shape) -> bool {
        from.kind() == Kind::String && to.kind() == Kind::Bool
    }

    fn convert(
        &self,
        _registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError> {
        let Value::Str(text) = &value else {
            return Err(unexpected(&value, to));
        };
        match text.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(Value::Bool(true)),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(Value::Bool(false)),
            _ => Err(ConversionError::new(
                &Shape::Str,
                to,
                ConversionFailure::Parse(text.clone()),
            )),
        }
    }
}

/// Width changes, rejecting overflow and lossy float to integer casts.
pub struct NumberToNumber;

impl ConversionRule for NumberToNumber {
    fn name(&self) -> &str {
        "number->number"
    }

    fn accepts(&self, from: &Shape, to: &Shape) -> bool {
        from.kind() == Kind::Number && to.kind() == Kind::Number
    }

    fn convert(
        &self,
        _registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError> {
        match (&value, to) {
            (Value::Number(n), Shape::Number(kind)) => n
                .cast(*kind)
                .map(Value::Number)
                .map_err(|reason| ConversionError::new(&value.shape(), to, reason)),
            _ => Err(unexpected(&value, to)),
        }
    }
}

/// `Option<A>` into `Option<B>`; an empty source stays empty.
pub struct OptionalToOptional;

impl ConversionRule for OptionalToOptional {
    fn name(&self) -> &str {
        "optional->optional"
    }

    fn accepts(&self, from: &Shape, to: &Shape) -> bool {
        from.kind() == Kind::Optional && to.kind() == Kind::Optional
    }

    fn convert(
        &self,
        registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError> {
        let Shape::Optional(elem) = to else {
            return Err(unexpected(&value, to));
        };
        match value {
            Value::Optional { inner: None, .. } => Ok(Value::Optional {
                elem: (**elem).clone(),
                inner: None,
            }),
            Value::Optional { inner: Some(v), .. } => {
                let converted = registry.convert_value(*v, elem)?;
                Ok(Value::Optional {
                    elem: (**elem).clone(),
                    inner: Some(Box::new(converted)),
                })
            }
            other => Err(unexpected(&other, to)),
        }
    }
}

/// A plain value into `Option<B>`. A zero source leaves the option empty.
pub struct ValueToOptional;

impl ConversionRule for ValueToOptional {
    fn name(&self) -> &str {
        "value->optional"
    }

    fn accepts(&self, from: &Shape, to: &Shape) -> bool {
        from.kind() != Kind::Optional && to.kind() == Kind::Optional
    }

    fn convert(
        &self,
        registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError> {
        let Shape::Optional(elem) = to else {
            return Err(unexpected(&value, to));
        };
        let inner = if value.is_zero() {
            None
        } else {
            Some(Box::new(registry.convert_value(value, elem)?))
        };
        Ok(Value::Optional {
            elem: (**elem).clone(),
            inner,
        })
    }
}

/// Map into map, converting every key and value.
pub struct MapToMap;

impl ConversionRule for MapToMap {
    fn name(&self) -> &str {
        "map->map"
    }

    fn accepts(&self, from: &Shape, to: &Shape) -> bool {
        from.kind() == Kind::Map && to.kind() == Kind::Map
    }

    fn convert(
        &self,
        registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError> {
        let Shape::Map(key, val) = to else {
            return Err(unexpected(&value, to));
        };
        let entries = match value {
            Value::Map { entries, .. } => entries,
            other => return Err(unexpected(&other, to)),
        };
        let entries = entries
            .into_iter()
            .map(|(k, v)| -> Result<(Value, Value), ConversionError> {
                Ok((registry.convert_value(k, key)?, registry.convert_value(v, val)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Map {
            key: (**key).clone(),
            value: (**val).clone(),
            entries,
        })
    }
}

/// Lists and arrays into lists and arrays, element by element.
///
/// An array destination takes at most its length; shorter sources leave the
/// trailing positions at their default.
pub struct ListToList;

impl ConversionRule for ListToList {
    fn name(&self) -> &str {
        "list->list"
    }

    fn accepts(&self, from: &Shape, to: &Shape) -> bool {
        matches!(from.kind(), Kind::List | Kind::Array) && matches!(to.kind(), Kind::List | Kind::Array)
    }

    fn convert(
        &self,
        registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError> {
        let from = value.shape();
        let items = match value {
            Value::List { items, .. } | Value::Array { items, .. } => items,
            other => return Err(unexpected(&other, to)),
        };
        match to {
            Shape::List(elem) => Ok(Value::List {
                elem: (**elem).clone(),
                items: convert_items(registry, items, elem)?,
            }),
            Shape::Array(len, elem) => {
                if items.len() > *len {
                    return Err(ConversionError::new(
                        &from,
                        to,
                        ConversionFailure::Capacity {
                            len: items.len(),
                            capacity: *len,
                        },
                    ));
                }
                Ok(Value::Array {
                    len: *len,
                    elem: (**elem).clone(),
                    items: convert_items(registry, items, elem)?,
                })
            }
            _ => Err(ConversionError::new(&from, to, ConversionFailure::Unexpected)),
        }
    }
}

fn convert_items(
    registry: &ConversionRegistry,
    items: Vec<Value>,
    elem: &Shape,
) -> Result<Vec<Value>, ConversionError> {
    items
        .into_iter()
        .map(|item| registry.convert_value(item, elem))
        .collect()
}

/// An undecoded JSON document into a record struct.
pub struct JsonToRecord;

impl ConversionRule for JsonToRecord {
    fn name(&self) -> &str {
        "json->struct"
    }

    fn accepts(&self, from: &Shape, to: &Shape) -> bool {
        *from == Shape::Blob(BlobKind::Json) && to.kind() == Kind::Struct
    }

    fn convert(
        &self,
        _registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError> {
        let (Value::Blob(BlobKind::Json, bytes), Shape::Struct(shape)) = (&value, to) else {
            return Err(unexpected(&value, to));
        };
        let data = serde_json::from_slice(bytes).map_err(|e| {
            ConversionError::new(&value.shape(), to, ConversionFailure::Decode(e.to_string()))
        })?;
        Ok(Value::Record {
            shape: shape.clone(),
            data,
        })
    }
}

/// Anything into a dynamic destination, unchanged.
pub struct ToDynamic;

impl ConversionRule for ToDynamic {
    fn name(&self) -> &str {
        "any->dynamic"
    }

    fn accepts(&self, _from: &Shape, to: &Shape) -> bool {
        to.kind() == Kind::Dynamic
    }

    fn convert(
        &self,
        _registry: &ConversionRegistry,
        value: Value,
        _to: &Shape,
    ) -> Result<Value, ConversionError> {
        Ok(value)
    }
}

type AcceptsFn = dyn Fn(&Shape, &Shape) -> bool + Send + Sync;
type ConvertFn =
    dyn Fn(&ConversionRegistry, Value, &Shape) -> Result<Value, ConversionError> + Send + Sync;

/// A rule assembled from two closures.
pub struct FnRule {
    name: String,
    accepts: Box<AcceptsFn>,
    convert: Box<ConvertFn>,
}

impl FnRule {
    pub fn new<A, C>(name: impl Into<String>, accepts: A, convert: C) -> Self
    where
        A: Fn(&Shape, &Shape) -> bool + Send + Sync + 'static,
        C: Fn(&ConversionRegistry, Value, &Shape) -> Result<Value, ConversionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            accepts: Box::new(accepts),
            convert: Box::new(convert),
        }
    }
}

impl ConversionRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, from: &Shape, to: &Shape) -> bool {
        (self.accepts)(from, to)
    }

    fn convert(
        &self,
        registry: &ConversionRegistry,
        value: Value,
        to: &Shape,
    ) -> Result<Value, ConversionError> {
        (self.convert)(registry, value, to)
    }
}

/// The built-in rule set, in precedence order.
#[must_use]
pub fn default_rules() -> Vec<Arc<dyn ConversionRule>> {
    vec![
        Arc::new(StrToNumber),
        Arc::new(StrToBool),
        Arc::new(NumberToNumber),
        Arc::new(OptionalToOptional),
        Arc::new(ValueToOptional),
        Arc::new(MapToMap),
        Arc::new(ListToList),
        Arc::new(JsonToRecord),
        Arc::new(ToDynamic),
    ]
}
