//! # Binder Module
//!
//! Populates a request struct from a [`RequestSource`].
//!
//! ## Binding Policy
//!
//! For every binding in the struct's request plan:
//!
//! | Values found | Destination | Result |
//! |--------------|-------------|--------|
//! | none | any | field untouched, or [`BindError::Missing`] when tagged `required` |
//! | one | any | converted through the [`ConversionRegistry`] |
//! | many | list or array | the whole list is converted |
//! | many | anything else | [`BindError::MultipleValues`] |
//!
//! Body fields decode the whole payload into a fresh value (`json`, `xml`);
//! `form` is rejected with [`BindError::NotImplemented`]. A missing or empty
//! body leaves body fields untouched.
//!
//! ## Atomicity
//!
//! Values are staged for every binding first and committed only when all of
//! them succeeded. A failed bind never leaves a half-populated struct.
//!
//! [`BindError::Missing`]: crate::error::BindError::Missing
//! [`BindError::MultipleValues`]: crate::error::BindError::MultipleValues
//! [`BindError::NotImplemented`]: crate::error::BindError::NotImplemented
//! [`ConversionRegistry`]: crate::convert::ConversionRegistry

mod core;
mod source;

pub use core::{PathBinder, RequestBinder, RequestBinderBuilder};
pub use source::{parse_query_pairs, RequestParts, RequestSource};

#[cfg(test)]
mod tests;
