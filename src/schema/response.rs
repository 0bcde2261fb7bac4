use super::descriptor::{flatten, FieldDescriptor, Schema};
use super::tags::TagSet;
use crate::codec::ContentKind;
use crate::config::WriterConfig;
use crate::error::SchemaError;
use crate::reflect::Shape;
use std::collections::HashMap;
use std::fmt;

/// Status a response field contributes when it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Code(u16),
    /// `code:"default"`: the field never decides the status by itself
    AnyResponse,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Code(code) => code.fmt(f),
            Status::AnyResponse => f.write_str("default"),
        }
    }
}

/// Where a response field goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Header(String),
    Body(ContentKind),
}

pub struct ResponseBinding<S> {
    pub field: FieldDescriptor<S>,
    pub target: Target,
    pub status: Status,
}

/// Flattened, validated bindings of a response struct, in declaration order.
pub struct ResponsePlan<S> {
    bindings: Vec<ResponseBinding<S>>,
}

impl<S: 'static> fmt::Debug for ResponsePlan<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|b| {
                format!("{} -> {:?} [{}]", b.field.display_path(), b.target, b.status)
            }))
            .finish()
    }
}

impl<S: Schema> ResponsePlan<S> {
    pub fn build(config: &WriterConfig) -> Result<Self, SchemaError> {
        let ty = <S as Schema>::shape().identity();
        let tags = &config.tags;
        let mut bindings = Vec::new();
        let mut seen: HashMap<&'static str, String> = HashMap::new();

        for field in flatten(S::fields()) {
            let path = field.display_path();
            let parsed = TagSet::parse(field.tag).map_err(|reason| SchemaError::MalformedTag {
                ty: ty.clone(),
                field: path.clone(),
                reason,
            })?;

            let target = match (parsed.get(&tags.header), parsed.get(&tags.body)) {
                (Some(_), Some(_)) => {
                    return Err(SchemaError::MultipleLocations { ty, field: path })
                }
                (None, None) => return Err(SchemaError::UndeterminedLocation { ty, field: path }),
                (Some(header), None) => {
                    match field.shape() {
                        Some(shape) if !shape.is_scalar() => {
                            return Err(SchemaError::UnsupportedHeaderType {
                                ty,
                                field: path,
                                shape: shape.identity(),
                            });
                        }
                        _ => {}
                    }
                    let key = match header.split(',').next().unwrap_or_default() {
                        "" => field.name().to_string(),
                        key => key.to_string(),
                    };
                    Target::Header(key)
                }
                (None, Some(body)) => {
                    let kind = match body.split(',').next().unwrap_or_default() {
                        "" => Some(config.default_content_kind),
                        raw => ContentKind::parse(raw),
                    };
                    match kind {
                        Some(kind @ (ContentKind::Json | ContentKind::Xml | ContentKind::Text)) => {
                            Target::Body(kind)
                        }
                        _ => {
                            return Err(SchemaError::UnknownBodyKind {
                                ty,
                                field: path,
                                kind: body.to_string(),
                            })
                        }
                    }
                }
            };

            let status = match parsed.get(&tags.code) {
                Some("default") => Status::AnyResponse,
                Some(raw) if !raw.is_empty() => match raw.parse::<u16>() {
                    Ok(code) if (100..=999).contains(&code) => Status::Code(code),
                    _ => {
                        return Err(SchemaError::InvalidStatusCode {
                            ty,
                            field: path,
                            code: raw.to_string(),
                        })
                    }
                },
                _ if field.shape().is_some_and(Shape::is_failure) => {
                    Status::Code(config.error_status)
                }
                _ => Status::Code(config.success_status),
            };

            if let Some(first) = seen.insert(field.name(), path.clone()) {
                return Err(SchemaError::DuplicateField {
                    ty,
                    field: field.name().to_string(),
                    first,
                    second: path,
                });
            }

            bindings.push(ResponseBinding {
                field,
                target,
                status,
            });
        }

        Ok(Self { bindings })
    }

    #[must_use]
    pub fn bindings(&self) -> &[ResponseBinding<S>] {
        &self.bindings
    }
}
