use super::source::RequestSource;
use crate::cache::PublishCache;
use crate::codec::ContentKind;
use crate::config::BinderConfig;
use crate::convert::ConversionRegistry;
use crate::error::{BindError, PathError};
use crate::path::{PathPattern, Values};
use crate::reflect::{Slot, Staged, Value};
use crate::schema::{Location, RequestBinding, Schema, SchemaCache};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};

struct Inner {
    config: BinderConfig,
    registry: ConversionRegistry,
    schemas: SchemaCache,
    patterns: PublishCache<PathPattern>,
}

/// Populates request structs from headers, query parameters, path captures
/// and the body.
///
/// Cheap to clone; clones share their schema and pattern caches, so one
/// binder is meant to serve every request of a process.
#[derive(Clone)]
pub struct RequestBinder {
    inner: Arc<Inner>,
}

impl Default for RequestBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBinder")
            .field("tags", &self.inner.config.tags)
            .field("registry", &self.inner.registry)
            .field("schemas", &self.inner.schemas)
            .field("patterns", &self.inner.patterns.len())
            .finish()
    }
}

/// Builder for [`RequestBinder`].
#[derive(Default)]
pub struct RequestBinderBuilder {
    config: BinderConfig,
    registry: Option<ConversionRegistry>,
}

impl RequestBinderBuilder {
    #[must_use]
    pub fn config(mut self, config: BinderConfig) -> Self {
        self.config = config;
        self
    }

    /// Conversion registry used for header, query and path values.
    #[must_use]
    pub fn registry(mut self, registry: ConversionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn build(self) -> RequestBinder {
        RequestBinder {
            inner: Arc::new(Inner {
                config: self.config,
                registry: self.registry.unwrap_or_default(),
                schemas: SchemaCache::new(),
                patterns: PublishCache::new("path_pattern"),
            }),
        }
    }
}

/// A binder with its path template compiled ahead of time.
#[derive(Clone, Debug)]
pub struct PathBinder {
    binder: RequestBinder,
    pattern: Arc<PathPattern>,
}

impl PathBinder {
    pub fn bind<S, R>(&self, source: &mut R, dest: &mut S) -> Result<(), BindError>
    where
        S: Schema,
        R: RequestSource + ?Sized,
    {
        self.binder.bind(source, self.pattern.template(), dest)
    }

    #[must_use]
    pub fn template(&self) -> &str {
        self.pattern.template()
    }
}

impl RequestBinder {
    /// A binder with the default tag names and conversion rules.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> RequestBinderBuilder {
        RequestBinderBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &BinderConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn registry(&self) -> &ConversionRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn schemas(&self) -> &SchemaCache {
        &self.inner.schemas
    }

    /// Compiled pattern for `template`, cached by raw template text.
    pub fn pattern(&self, template: &str) -> Result<Arc<PathPattern>, PathError> {
        self.inner
            .patterns
            .get_or_try_insert(template, || PathPattern::compile(template).map(Arc::new))
    }

    /// Number of compiled path patterns held by this binder.
    #[must_use]
    pub fn cached_patterns(&self) -> usize {
        self.inner.patterns.len()
    }

    /// Compile `template` now and return a binder fixed to it.
    pub fn with_path(&self, template: &str) -> Result<PathBinder, PathError> {
        Ok(PathBinder {
            pattern: self.pattern(template)?,
            binder: self.clone(),
        })
    }

    /// Populate `dest` from `source`.
    ///
    /// `template` is only compiled and matched when `S` has path-bound fields.
    /// Every binding is staged before any field is written, so on error
    /// `dest` is left exactly as it was.
    pub fn bind<S, R>(&self, source: &mut R, template: &str, dest: &mut S) -> Result<(), BindError>
    where
        S: Schema,
        R: RequestSource + ?Sized,
    {
        let result = self.bind_staged(source, template, dest);
        if let Err(err) = &result {
            warn!(
                schema = %std::any::type_name::<S>(),
                template = %template,
                path = %source.path(),
                error = %err,
                "Request binding failed"
            );
        }
        result
    }

    fn bind_staged<S, R>(&self, source: &mut R, template: &str, dest: &mut S) -> Result<(), BindError>
    where
        S: Schema,
        R: RequestSource + ?Sized,
    {
        let plan = self.inner.schemas.request::<S>(&self.inner.config.tags)?;
        let bindings = plan.bindings();

        let mut captures: Option<HashMap<String, Values>> = None;
        let mut body: Option<Vec<u8>> = None;
        let mut staged: Vec<(usize, Staged)> = Vec::with_capacity(bindings.len());

        for (index, binding) in bindings.iter().enumerate() {
            let Some(slot) = binding.field.slot(dest) else {
                continue;
            };
            let next = match binding.location {
                Location::Body => {
                    if body.is_none() {
                        body = Some(read_body(source)?);
                    }
                    self.stage_body(binding, slot, body.as_deref().unwrap_or_default())?
                }
                Location::Header => {
                    self.stage_values(binding, slot, source.header_values(&binding.key))?
                }
                Location::Query => {
                    self.stage_values(binding, slot, source.query_values(&binding.key))?
                }
                Location::Path => {
                    if captures.is_none() {
                        captures = Some(self.pattern(template)?.matches(source.path())?);
                    }
                    let values = captures
                        .as_ref()
                        .and_then(|c| c.get(&binding.key))
                        .map(|v| v.to_vec())
                        .unwrap_or_default();
                    self.stage_values(binding, slot, values)?
                }
            };
            if let Some(next) = next {
                staged.push((index, next));
            }
        }

        debug!(
            schema = %std::any::type_name::<S>(),
            bound = staged.len(),
            bindings = bindings.len(),
            "Request values staged"
        );

        for (index, value) in staged {
            let binding = &bindings[index];
            if let Some(slot) = binding.field.slot_mut(dest) {
                slot.commit(value);
            }
        }
        Ok(())
    }

    /// Apply the multi-value policy to one header, query or path binding.
    fn stage_values<S>(
        &self,
        binding: &RequestBinding<S>,
        slot: &dyn Slot,
        values: Vec<String>,
    ) -> Result<Option<Staged>, BindError> {
        let count = values.len();
        if count == 0 {
            if binding.required {
                return Err(BindError::Missing {
                    location: binding.location,
                    key: binding.key.clone(),
                });
            }
            return Ok(None);
        }

        let shape = slot.shape();
        let raw = if shape.is_list_like() {
            Value::strings(values)
        } else if count > 1 {
            return Err(BindError::MultipleValues {
                location: binding.location,
                key: binding.key.clone(),
                count,
            });
        } else {
            Value::Str(values.into_iter().next().unwrap_or_default())
        };

        let failed = |source| BindError::Conversion {
            location: binding.location,
            key: binding.key.clone(),
            source,
        };
        let value = self
            .inner
            .registry
            .convert_value(raw, &shape)
            .map_err(failed)?;
        slot.stage(value).map(Some).map_err(failed)
    }

    fn stage_body<S>(
        &self,
        binding: &RequestBinding<S>,
        slot: &dyn Slot,
        bytes: &[u8],
    ) -> Result<Option<Staged>, BindError> {
        if bytes.is_empty() {
            if binding.required {
                return Err(BindError::Missing {
                    location: Location::Body,
                    key: binding.key.clone(),
                });
            }
            return Ok(None);
        }
        match binding.content_kind.unwrap_or(ContentKind::Json) {
            kind @ (ContentKind::Json | ContentKind::Xml) => slot
                .stage_payload(kind, bytes)
                .map(Some)
                .map_err(|source| BindError::Body { kind, source }),
            ContentKind::Form => Err(BindError::NotImplemented(ContentKind::Form)),
            other => Err(BindError::UnknownBodyKind(other)),
        }
    }
}

/// Drain the body stream; an absent body reads as empty.
fn read_body<R: RequestSource + ?Sized>(source: &mut R) -> Result<Vec<u8>, BindError> {
    let mut bytes = Vec::new();
    if let Some(mut reader) = source.body() {
        reader.read_to_end(&mut bytes)?;
    }
    debug!(size_bytes = bytes.len(), "Request body read");
    Ok(bytes)
}
