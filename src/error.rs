//! # Error Module
//!
//! Every failure the engine can report, grouped by the stage that raises it.
//!
//! | Error | Raised by | Effect |
//! |-------|-----------|--------|
//! | [`SchemaError`] | schema derivation | fatal for that type until the tags are fixed |
//! | [`ConversionError`] | [`ConversionRegistry`](crate::convert::ConversionRegistry) | aborts the current bind |
//! | [`PathError`] | [`PathPattern`](crate::path::PathPattern) | aborts the current bind |
//! | [`CodecError`] | body decode / encode | aborts the bind or the write |
//! | [`BindError`] | [`RequestBinder`](crate::binder::RequestBinder) | returned to the caller |
//! | [`WriteError`] | [`ResponseWriter`](crate::writer::ResponseWriter) | handed to the failure handler |
//!
//! Binder errors are always surfaced synchronously. Writer errors are the only
//! ones with a configurable recovery policy because a response must still be
//! produced once they are detected.

use crate::codec::ContentKind;
use crate::reflect::Shape;
use crate::schema::Location;
use thiserror::Error;

/// Why a single conversion failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionFailure {
    /// No registered rule accepts the (source, destination) pair
    #[error("no conversion rule accepts this pair")]
    NoRule,
    /// A textual number or boolean could not be parsed
    #[error("invalid literal '{0}'")]
    Parse(String),
    /// A numeric value does not fit the destination width, or would lose its fraction
    #[error("value {0} does not fit the destination")]
    Overflow(String),
    /// A list is longer than the destination array
    #[error("in size '{len}' exceed array length '{capacity}'")]
    Capacity {
        /// Source length
        len: usize,
        /// Destination array length
        capacity: usize,
    },
    /// The value handed to a rule or a destination does not have the shape it announced
    #[error("value does not have the expected shape")]
    Unexpected,
    /// A self-describing payload could not be decoded
    #[error("payload decode failed: {0}")]
    Decode(String),
}

/// A value could not be coerced from one shape into another.
///
/// `from` and `to` are type identities, see [`Shape::identity`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{from}' to '{to}': {reason}")]
pub struct ConversionError {
    /// Identity of the source shape
    pub from: String,
    /// Identity of the destination shape
    pub to: String,
    /// What went wrong
    pub reason: ConversionFailure,
}

impl ConversionError {
    pub fn new(from: &Shape, to: &Shape, reason: ConversionFailure) -> Self {
        Self {
            from: from.identity(),
            to: to.identity(),
            reason,
        }
    }
}

/// Malformed binding metadata on a struct.
///
/// `ty` is the identity of the struct the offending field belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("struct field '{field}' of '{ty}' has more than one location tag")]
    MultipleLocations { ty: String, field: String },

    #[error("response field '{field}' of '{ty}' declares neither a header nor a body tag")]
    UndeterminedLocation { ty: String, field: String },

    #[error("struct field '{field}' of '{ty}' has unknown body kind '{kind}'")]
    UnknownBodyKind {
        ty: String,
        field: String,
        kind: String,
    },

    #[error("struct field '{field}' of '{ty}' has invalid status code '{code}'")]
    InvalidStatusCode {
        ty: String,
        field: String,
        code: String,
    },

    #[error("header field '{field}' of '{ty}' has non-scalar type '{shape}'")]
    UnsupportedHeaderType {
        ty: String,
        field: String,
        shape: String,
    },

    /// Two bindings resolve to the same field name through different embeddings
    #[error("field '{field}' of '{ty}' is bound twice ({first} and {second})")]
    DuplicateField {
        ty: String,
        field: String,
        first: String,
        second: String,
    },

    #[error("struct field '{field}' of '{ty}' has a malformed tag: {reason}")]
    MalformedTag {
        ty: String,
        field: String,
        reason: String,
    },
}

/// Path template compilation and matching failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path template length should not be 0")]
    EmptyTemplate,

    #[error("path template '{template}' has a placeholder without a name")]
    EmptyPlaceholder { template: String },

    #[error("path template '{template}' compiles to an invalid expression: {reason}")]
    InvalidExpression { template: String, reason: String },

    #[error("uri '{url}' does not match pattern '{template}'")]
    Mismatch { url: String, template: String },
}

/// Structured body decode / encode failures.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml: {0}")]
    Xml(String),

    #[error("body is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("content kind '{0}' is not supported here")]
    Unsupported(ContentKind),
}

/// Failure while populating a request object.
///
/// Any single-field error aborts the whole bind and leaves the destination
/// untouched.
#[derive(Debug, Error)]
pub enum BindError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("failed to bind {location} '{key}': {source}")]
    Conversion {
        location: Location,
        key: String,
        #[source]
        source: ConversionError,
    },

    #[error("multiple value occurred on {location} key '{key}' ({count} values)")]
    MultipleValues {
        location: Location,
        key: String,
        count: usize,
    },

    #[error("required {location} key '{key}' is missing")]
    Missing { location: Location, key: String },

    #[error("error decode {kind} body: {source}")]
    Body {
        kind: ContentKind,
        #[source]
        source: CodecError,
    },

    #[error("body kind '{0}' is not implemented")]
    NotImplemented(ContentKind),

    #[error("unknown body kind '{0}'")]
    UnknownBodyKind(ContentKind),

    #[error("failed to read request body: {0}")]
    Read(#[from] std::io::Error),
}

/// Failure while turning a response object into a response.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("multiple status code would be written: {0:?}")]
    ConflictingStatusCodes(Vec<u16>),

    #[error("multiple body would be written: {0:?}")]
    ConflictingBodyFields(Vec<String>),

    #[error("no response to write: every response field is empty")]
    NothingToWrite,

    #[error("failed to encode field '{field}' as {kind}: {source}")]
    Encode {
        field: String,
        kind: ContentKind,
        #[source]
        source: CodecError,
    },
}
