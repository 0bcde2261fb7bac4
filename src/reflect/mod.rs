//! # Reflection Module
//!
//! The closed shape model every other module works against.
//!
//! - [`Shape`] describes a type and renders its identity string
//! - [`Value`] is a dynamically shaped value carrying its own shape
//! - [`Reflect`] is implemented by every type a field may have
//! - [`Slot`] is the object-safe view the binder and writer use on fields
//!
//! Rules in [`crate::convert`] dispatch on [`Kind`] and never on concrete Rust
//! types, so adding a leaf type means implementing [`Reflect`] for it (or
//! deriving `Record` for a serde struct).

mod impls;
mod shape;
mod slot;
mod value;

pub use impls::{
    record_from_value, record_is_zero, record_shape, record_to_value, Failure, RawJson, RawXml,
    Reflect,
};
pub use shape::{BlobKind, FieldShape, Kind, NumberKind, Shape, StructShape};
pub use slot::{Slot, Staged};
pub use value::{Number, Value};

/// Identity string of `T`'s shape.
#[must_use]
pub fn identity_of<T: Reflect>() -> String {
    T::shape().identity()
}
