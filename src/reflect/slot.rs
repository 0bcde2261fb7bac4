use super::impls::Reflect;
use super::shape::Shape;
use super::value::Value;
use crate::codec::{self, ContentKind};
use crate::error::{CodecError, ConversionError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;

/// A fully built replacement for a slot, waiting to be committed.
pub type Staged = Box<dyn Any + Send>;

/// Object-safe view of a bindable struct field.
///
/// Binding is two-phase: [`stage`](Slot::stage) and
/// [`stage_payload`](Slot::stage_payload) build the new field value without
/// touching the field, [`commit`](Slot::commit) moves it in. The binder stages
/// every field before it commits any of them.
pub trait Slot: Send {
    fn shape(&self) -> Shape;

    fn value(&self) -> Value;

    fn is_zero(&self) -> bool;

    /// Build a replacement from a value already coerced to [`Slot::shape`].
    fn stage(&self, value: Value) -> Result<Staged, ConversionError>;

    /// Build a replacement by decoding a structured payload.
    fn stage_payload(&self, kind: ContentKind, bytes: &[u8]) -> Result<Staged, CodecError>;

    /// Move in a replacement built by this slot's [`Slot::stage`] or
    /// [`Slot::stage_payload`]. A value of any other type is dropped.
    fn commit(&mut self, staged: Staged);

    fn encode(&self, kind: ContentKind) -> Result<Vec<u8>, CodecError>;
}

impl<T> Slot for T
where
    T: Reflect + Serialize + DeserializeOwned + Send + 'static,
{
    fn shape(&self) -> Shape {
        <T as Reflect>::shape()
    }

    fn value(&self) -> Value {
        self.to_value()
    }

    fn is_zero(&self) -> bool {
        Reflect::is_zero(self)
    }

    fn stage(&self, value: Value) -> Result<Staged, ConversionError> {
        T::from_value(value).map(|v| Box::new(v) as Staged)
    }

    fn stage_payload(&self, kind: ContentKind, bytes: &[u8]) -> Result<Staged, CodecError> {
        codec::decode::<T>(kind, bytes).map(|v| Box::new(v) as Staged)
    }

    fn commit(&mut self, staged: Staged) {
        if let Ok(v) = staged.downcast::<T>() {
            *self = *v;
        }
    }

    fn encode(&self, kind: ContentKind) -> Result<Vec<u8>, CodecError> {
        codec::encode(kind, self, &<T as Reflect>::shape(), || self.to_value())
    }
}
