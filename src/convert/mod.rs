//! # Conversion Module
//!
//! Coerces dynamic [`Value`](crate::reflect::Value)s into typed destinations.
//!
//! A [`ConversionRegistry`] is an ordered list of [`ConversionRule`]s. For a
//! given `(source shape, destination shape)` pair the first accepting rule
//! wins. Identical shapes never reach a rule.
//!
//! ## Default rules
//!
//! | Rule | From | To |
//! |------|------|----|
//! | [`StrToNumber`] | string | any number width |
//! | [`StrToBool`] | string | bool |
//! | [`NumberToNumber`] | number | number (range checked) |
//! | [`OptionalToOptional`] | `Option<A>` | `Option<B>` |
//! | [`ValueToOptional`] | `A` | `Option<B>` |
//! | [`MapToMap`] | map | map |
//! | [`ListToList`] | list / array | list / array |
//! | [`JsonToRecord`] | raw JSON | record struct |
//! | [`ToDynamic`] | anything | [`Value`](crate::reflect::Value) |
//!
//! ## Custom rules
//!
//! ```rust,ignore
//! let registry = ConversionRegistry::builder()
//!     .rule_fn(
//!         "bool->string",
//!         |from, to| *from == Shape::Bool && *to == Shape::Str,
//!         |_, value, _| Ok(Value::Str(value.render_text())),
//!     )
//!     .build();
//! ```

mod registry;
mod rules;

pub use registry::{ConversionRegistry, ConversionRegistryBuilder};
pub use rules::{
    default_rules, ConversionRule, FnRule, JsonToRecord, ListToList, MapToMap, NumberToNumber,
    OptionalToOptional, StrToBool, StrToNumber, ToDynamic, ValueToOptional,
};
