use std::borrow::Cow;
use std::fmt;

/// Width and signedness of a numeric shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl NumberKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NumberKind::I8 => "i8",
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::Isize => "isize",
            NumberKind::U8 => "u8",
            NumberKind::U16 => "u16",
            NumberKind::U32 => "u32",
            NumberKind::U64 => "u64",
            NumberKind::Usize => "usize",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        }
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, NumberKind::F32 | NumberKind::F64)
    }
}

/// Flavour of an opaque, self-describing payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    Json,
    Xml,
}

/// The closed set of kinds conversion rules dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Number,
    String,
    Optional,
    List,
    Array,
    Map,
    Struct,
    Blob,
    Failure,
    Dynamic,
}

/// One field of an unnamed struct shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldShape {
    pub name: Cow<'static, str>,
    pub shape: Shape,
    /// Raw tag text, e.g. `query:"u"`; empty when untagged
    pub tag: Cow<'static, str>,
}

/// A struct shape: either named (identity is the qualified name) or unnamed
/// (identity is the ordered field list including raw tag text).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructShape {
    pub name: Option<Cow<'static, str>>,
    pub fields: Vec<FieldShape>,
}

impl StructShape {
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: Some(name.into()),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn unnamed(fields: Vec<FieldShape>) -> Self {
        Self { name: None, fields }
    }
}

/// Runtime description of a type's shape.
///
/// Every [`Reflect`](super::Reflect) type reports one. Composite shapes carry
/// their element shapes so that empty values still know what they hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Bool,
    Number(NumberKind),
    Str,
    /// `Option<T>`, the pointer analogue: may be empty, allocated lazily
    Optional(Box<Shape>),
    List(Box<Shape>),
    Array(usize, Box<Shape>),
    Map(Box<Shape>, Box<Shape>),
    Struct(StructShape),
    Blob(BlobKind),
    /// An error-typed value; drives the error default status code
    Failure,
    /// Accepts any value, the interface-like destination
    Dynamic,
}

impl Shape {
    #[must_use]
    pub fn optional(inner: Shape) -> Self {
        Shape::Optional(Box::new(inner))
    }

    #[must_use]
    pub fn list(elem: Shape) -> Self {
        Shape::List(Box::new(elem))
    }

    #[must_use]
    pub fn array(len: usize, elem: Shape) -> Self {
        Shape::Array(len, Box::new(elem))
    }

    #[must_use]
    pub fn map(key: Shape, value: Shape) -> Self {
        Shape::Map(Box::new(key), Box::new(value))
    }

    #[must_use]
    pub fn record(name: impl Into<Cow<'static, str>>) -> Self {
        Shape::Struct(StructShape::named(name))
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Shape::Bool => Kind::Bool,
            Shape::Number(_) => Kind::Number,
            Shape::Str => Kind::String,
            Shape::Optional(_) => Kind::Optional,
            Shape::List(_) => Kind::List,
            Shape::Array(..) => Kind::Array,
            Shape::Map(..) => Kind::Map,
            Shape::Struct(_) => Kind::Struct,
            Shape::Blob(_) => Kind::Blob,
            Shape::Failure => Kind::Failure,
            Shape::Dynamic => Kind::Dynamic,
        }
    }

    /// Stable identity string, used as cache key and for exact-type matching.
    ///
    /// Two shapes with the same identity are interchangeable.
    #[must_use]
    pub fn identity(&self) -> String {
        self.to_string()
    }

    /// Slices and arrays, seen through at most one `Option`.
    #[must_use]
    pub fn is_list_like(&self) -> bool {
        match self {
            Shape::List(_) | Shape::Array(..) => true,
            Shape::Optional(inner) => matches!(**inner, Shape::List(_) | Shape::Array(..)),
            _ => false,
        }
    }

    /// Values that render to a single line of text.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        match self {
            Shape::Bool | Shape::Number(_) | Shape::Str | Shape::Failure => true,
            Shape::Optional(inner) => inner.is_scalar(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        match self {
            Shape::Failure => true,
            Shape::Optional(inner) => inner.is_failure(),
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Bool => f.write_str("bool"),
            Shape::Number(kind) => f.write_str(kind.name()),
            Shape::Str => f.write_str("String"),
            Shape::Optional(inner) => write!(f, "Option<{inner}>"),
            Shape::List(elem) => write!(f, "Vec<{elem}>"),
            Shape::Array(len, elem) => write!(f, "[{elem}; {len}]"),
            Shape::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            Shape::Struct(shape) => shape.fmt(f),
            Shape::Blob(BlobKind::Json) => f.write_str("RawJson"),
            Shape::Blob(BlobKind::Xml) => f.write_str("RawXml"),
            Shape::Failure => f.write_str("error"),
            Shape::Dynamic => f.write_str("dyn Value"),
        }
    }
}

impl fmt::Display for StructShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            return f.write_str(name);
        }
        f.write_str("struct { ")?;
        for (i, field) in self.fields.iter().enumerate() {
            write!(f, "{}: {}", field.name, field.shape)?;
            if !field.tag.is_empty() {
                write!(f, " \"{}\"", field.tag.replace('"', "\\\""))?;
            }
            if i + 1 != self.fields.len() {
                f.write_str("; ")?;
            }
        }
        f.write_str(" }")
    }
}
