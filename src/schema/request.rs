use super::descriptor::{flatten, FieldDescriptor, Schema};
use super::tags::{lower_camel, TagSet, TagValue};
use super::Location;
use crate::codec::ContentKind;
use crate::config::TagNames;
use crate::error::SchemaError;
use std::collections::HashMap;

/// Where one request field is bound from.
pub struct RequestBinding<S> {
    pub field: FieldDescriptor<S>,
    pub location: Location,
    /// Header name, query key or path placeholder; the content kind name for bodies
    pub key: String,
    /// Body fields only
    pub content_kind: Option<ContentKind>,
    /// The tag carried the `required` option
    pub required: bool,
}

/// Flattened, validated bindings of a request struct, in declaration order.
pub struct RequestPlan<S> {
    bindings: Vec<RequestBinding<S>>,
}

impl<S: 'static> std::fmt::Debug for RequestPlan<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|b| {
                format!("{} <- {} '{}'", b.field.display_path(), b.location, b.key)
            }))
            .finish()
    }
}

impl<S: Schema> RequestPlan<S> {
    /// Derive the plan for `S` from its field descriptors.
    pub fn build(tags: &TagNames) -> Result<Self, SchemaError> {
        let ty = <S as Schema>::shape().identity();
        let mut bindings: Vec<RequestBinding<S>> = Vec::new();
        let mut seen: HashMap<&'static str, String> = HashMap::new();

        for field in flatten(S::fields()) {
            let malformed = |reason: String| SchemaError::MalformedTag {
                ty: ty.clone(),
                field: field.display_path(),
                reason,
            };
            let parsed = TagSet::parse(field.tag).map_err(malformed)?;

            let candidates = [
                (Location::Query, tags.query.as_str()),
                (Location::Path, tags.path.as_str()),
                (Location::Header, tags.header.as_str()),
                (Location::Body, tags.body.as_str()),
            ];
            let mut present = candidates
                .iter()
                .filter_map(|(loc, name)| parsed.get(name).map(|v| (*loc, TagValue::new(v))));
            let Some((location, value)) = present.next() else {
                continue;
            };
            if present.next().is_some() {
                return Err(SchemaError::MultipleLocations {
                    ty,
                    field: field.display_path(),
                });
            }

            let explicit = value.key();
            let (key, content_kind) = match location {
                Location::Query | Location::Path if explicit.is_empty() => {
                    (lower_camel(field.name()), None)
                }
                Location::Header if explicit.is_empty() => (field.name().to_string(), None),
                Location::Body => {
                    let raw = if explicit.is_empty() { "json" } else { explicit };
                    match ContentKind::parse(raw) {
                        Some(kind @ (ContentKind::Json | ContentKind::Xml | ContentKind::Form)) => {
                            (raw.to_string(), Some(kind))
                        }
                        _ => {
                            return Err(SchemaError::UnknownBodyKind {
                                ty,
                                field: field.display_path(),
                                kind: raw.to_string(),
                            })
                        }
                    }
                }
                _ => (explicit.to_string(), None),
            };

            if let Some(first) = seen.insert(field.name(), field.display_path()) {
                return Err(SchemaError::DuplicateField {
                    ty,
                    field: field.name().to_string(),
                    first,
                    second: field.display_path(),
                });
            }

            bindings.push(RequestBinding {
                required: value.has_option("required"),
                field,
                location,
                key,
                content_kind,
            });
        }

        Ok(Self { bindings })
    }

    #[must_use]
    pub fn bindings(&self) -> &[RequestBinding<S>] {
        &self.bindings
    }

    /// Any binding reads the path.
    #[must_use]
    pub fn uses_path(&self) -> bool {
        self.bindings.iter().any(|b| b.location == Location::Path)
    }
}
