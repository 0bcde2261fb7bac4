//! Path templates: `{name}` placeholders compiled to anchored expressions.

mod pattern;

pub use pattern::{PathPattern, Values};
