use crate::reflect::{Reflect, Shape, Slot};
use std::sync::Arc;

/// Shared reader for one leaf field of `S`.
pub type Getter<S> = Arc<dyn for<'a> Fn(&'a S) -> &'a (dyn Slot + 'a) + Send + Sync>;

/// Shared writer for one leaf field of `S`.
pub type GetterMut<S> = Arc<dyn for<'a> Fn(&'a mut S) -> &'a mut (dyn Slot + 'a) + Send + Sync>;

type Expand<S> = Arc<dyn Fn() -> Vec<FieldDescriptor<S>> + Send + Sync>;
type Project<O, S> = Arc<dyn for<'a> Fn(&'a O) -> &'a S + Send + Sync>;
type ProjectMut<O, S> = Arc<dyn for<'a> Fn(&'a mut O) -> &'a mut S + Send + Sync>;

fn getter<S, F>(f: F) -> Getter<S>
where
    F: for<'a> Fn(&'a S) -> &'a (dyn Slot + 'a) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn getter_mut<S, F>(f: F) -> GetterMut<S>
where
    F: for<'a> Fn(&'a mut S) -> &'a mut (dyn Slot + 'a) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A struct whose fields carry binding tags.
///
/// Usually derived:
///
/// ```rust,ignore
/// #[derive(Default, Schema)]
/// struct ListUsers {
///     #[tag(query = "u")]
///     users: Vec<String>,
///     #[tag(header = "X-Trace")]
///     trace: Option<String>,
///     #[embed]
///     paging: Paging,
/// }
/// ```
pub trait Schema: Sized + 'static {
    /// Named struct shape; its identity keys the schema caches.
    fn shape() -> Shape {
        Shape::record(std::any::type_name::<Self>())
    }

    /// Field descriptors in declaration order.
    fn fields() -> Vec<FieldDescriptor<Self>>;
}

/// How a descriptor reaches its field.
pub enum Access<S> {
    /// A field with a value slot
    Leaf {
        shape: Shape,
        get: Getter<S>,
        get_mut: GetterMut<S>,
    },
    /// An untagged embedded struct; its own fields are bound in place
    Embedded { shape: Shape, expand: Expand<S> },
    /// A field without tags; its type is not inspected
    Untagged,
}

impl<S> Clone for Access<S> {
    fn clone(&self) -> Self {
        match self {
            Access::Leaf {
                shape,
                get,
                get_mut,
            } => Access::Leaf {
                shape: shape.clone(),
                get: Arc::clone(get),
                get_mut: Arc::clone(get_mut),
            },
            Access::Embedded { shape, expand } => Access::Embedded {
                shape: shape.clone(),
                expand: Arc::clone(expand),
            },
            Access::Untagged => Access::Untagged,
        }
    }
}

/// One field of a [`Schema`] struct.
pub struct FieldDescriptor<S> {
    /// Field names from the root struct down to this field
    pub path: Vec<&'static str>,
    /// Raw tag text, e.g. `query:"u,required"`
    pub tag: &'static str,
    pub access: Access<S>,
}

impl<S> Clone for FieldDescriptor<S> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            tag: self.tag,
            access: self.access.clone(),
        }
    }
}

impl<S> std::fmt::Debug for FieldDescriptor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let access = match &self.access {
            Access::Leaf { shape, .. } => shape.identity(),
            Access::Embedded { shape, .. } => format!("embedded {shape}"),
            Access::Untagged => "untagged".to_string(),
        };
        f.debug_struct("FieldDescriptor")
            .field("path", &self.path)
            .field("tag", &self.tag)
            .field("access", &access)
            .finish()
    }
}

impl<S: 'static> FieldDescriptor<S> {
    /// A field of type `T`, reached through `get` / `get_mut`.
    pub fn leaf<T, G, M>(name: &'static str, tag: &'static str, get: G, get_mut: M) -> Self
    where
        T: Reflect + Slot + 'static,
        G: for<'a> Fn(&'a S) -> &'a T + Send + Sync + 'static,
        M: for<'a> Fn(&'a mut S) -> &'a mut T + Send + Sync + 'static,
    {
        Self {
            path: vec![name],
            tag,
            access: Access::Leaf {
                shape: <T as Reflect>::shape(),
                get: getter(move |s: &S| get(s) as &dyn Slot),
                get_mut: getter_mut(move |s: &mut S| get_mut(s) as &mut dyn Slot),
            },
        }
    }

    /// A field with no tags. The request side skips it and the response
    /// side reports it, so its type needs no [`Reflect`] impl.
    #[must_use]
    pub fn untagged(name: &'static str) -> Self {
        Self {
            path: vec![name],
            tag: "",
            access: Access::Untagged,
        }
    }

    /// Shape of a leaf field or of the embedded struct; `None` when untagged.
    #[must_use]
    pub fn shape(&self) -> Option<&Shape> {
        match &self.access {
            Access::Leaf { shape, .. } | Access::Embedded { shape, .. } => Some(shape),
            Access::Untagged => None,
        }
    }

    /// Shared reader for a leaf; `None` otherwise.
    #[must_use]
    pub fn slot<'a>(&self, value: &'a S) -> Option<&'a dyn Slot> {
        match &self.access {
            Access::Leaf { get, .. } => Some(get(value)),
            Access::Embedded { .. } | Access::Untagged => None,
        }
    }

    #[must_use]
    pub fn slot_mut<'a>(&self, value: &'a mut S) -> Option<&'a mut dyn Slot> {
        match &self.access {
            Access::Leaf { get_mut, .. } => Some(get_mut(value)),
            Access::Embedded { .. } | Access::Untagged => None,
        }
    }

    /// An untagged embedded struct of schema type `E`.
    pub fn embedded<E, G, M>(name: &'static str, get: G, get_mut: M) -> Self
    where
        E: Schema,
        G: for<'a> Fn(&'a S) -> &'a E + Send + Sync + 'static,
        M: for<'a> Fn(&'a mut S) -> &'a mut E + Send + Sync + 'static,
    {
        let get: Project<S, E> = Arc::new(get);
        let get_mut: ProjectMut<S, E> = Arc::new(get_mut);
        Self {
            path: vec![name],
            tag: "",
            access: Access::Embedded {
                shape: E::shape(),
                expand: Arc::new(move || {
                    E::fields()
                        .into_iter()
                        .map(|inner| inner.lift(name, Arc::clone(&get), Arc::clone(&get_mut)))
                        .collect()
                }),
            },
        }
    }

    /// Field name as declared.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.path.last().copied().unwrap_or_default()
    }

    /// Dotted path, e.g. `paging.limit`.
    #[must_use]
    pub fn display_path(&self) -> String {
        self.path.join(".")
    }

    /// Re-root a descriptor of an embedded struct `S` at `O` through the
    /// embedding field `outer`.
    fn lift<O: 'static>(
        self,
        outer: &'static str,
        get: Project<O, S>,
        get_mut: ProjectMut<O, S>,
    ) -> FieldDescriptor<O> {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.push(outer);
        path.extend(self.path);

        let access = match self.access {
            Access::Leaf {
                shape,
                get: inner,
                get_mut: inner_mut,
            } => Access::Leaf {
                shape,
                get: getter(move |o: &O| inner(get(o))),
                get_mut: getter_mut(move |o: &mut O| inner_mut(get_mut(o))),
            },
            Access::Embedded { shape, expand } => Access::Embedded {
                shape,
                expand: Arc::new(move || {
                    expand()
                        .into_iter()
                        .map(|d| d.lift(outer, Arc::clone(&get), Arc::clone(&get_mut)))
                        .collect()
                }),
            },
            Access::Untagged => Access::Untagged,
        };

        FieldDescriptor {
            path,
            tag: self.tag,
            access,
        }
    }
}

/// Expand embedded descriptors in place, depth first.
pub(crate) fn flatten<S>(fields: Vec<FieldDescriptor<S>>) -> Vec<FieldDescriptor<S>> {
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let expanded = match &field.access {
            Access::Embedded { expand, .. } => Some(expand()),
            Access::Leaf { .. } | Access::Untagged => None,
        };
        match expanded {
            Some(inner) => out.extend(flatten(inner)),
            None => out.push(field),
        }
    }
    out
}
