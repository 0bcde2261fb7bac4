use super::sink::ResponseSink;
use crate::codec::ContentKind;
use crate::config::{WriterConfig, DEFAULT_TEXT_CONTENT_TYPE};
use crate::error::WriteError;
use crate::reflect::Slot;
use crate::schema::{Schema, SchemaCache, Status, Target};
use std::sync::Arc;
use tracing::{debug, warn};

pub const CONTENT_TYPE: &str = "Content-Type";

/// Called with the sink when a response cannot be written as declared.
///
/// Nothing has been written to the sink yet when it runs, so it is free to
/// emit a complete fallback response.
pub type FailureHandler = Arc<dyn Fn(&mut dyn ResponseSink, &WriteError) + Send + Sync>;

/// `text/plain` 500 carrying the error message.
pub fn plain_text_failure(sink: &mut dyn ResponseSink, err: &WriteError) {
    sink.set_header(CONTENT_TYPE, DEFAULT_TEXT_CONTENT_TYPE);
    sink.write_body(err.to_string().as_bytes());
    sink.set_status(500);
}

/// Encoded body of a [`WritePlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBody {
    /// Dotted path of the field the body came from
    pub field: String,
    pub kind: ContentKind,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Everything a response will consist of, computed before the sink is
/// touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    pub status: u16,
    /// Header name and rendered value, in declaration order
    pub headers: Vec<(String, String)>,
    pub body: Option<WriteBody>,
}

impl WritePlan {
    /// Emit headers, then content type and body, then the status.
    pub fn apply(&self, sink: &mut dyn ResponseSink) {
        for (name, value) in &self.headers {
            sink.set_header(name, value);
        }
        if let Some(body) = &self.body {
            sink.set_header(CONTENT_TYPE, &body.content_type);
            sink.write_body(&body.bytes);
        }
        sink.set_status(self.status);
    }
}

struct Inner {
    config: WriterConfig,
    schemas: SchemaCache,
    on_failure: FailureHandler,
}

/// Writes response structs: one status code, any number of headers and at
/// most one body.
///
/// A field takes part in a response when its value is not zero. Among the
/// participating fields:
///
/// - explicit codes must agree, otherwise [`WriteError::ConflictingStatusCodes`]
/// - `code:"default"` fields never pick the status; when they are the only
///   participants the configured success status is used
/// - at most one body, otherwise [`WriteError::ConflictingBodyFields`]
/// - no participant at all is [`WriteError::NothingToWrite`]
///
/// Errors go to the failure handler, see [`ResponseWriterBuilder::on_failure`].
#[derive(Clone)]
pub struct ResponseWriter {
    inner: Arc<Inner>,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("config", &self.inner.config)
            .field("schemas", &self.inner.schemas)
            .finish_non_exhaustive()
    }
}

pub struct ResponseWriterBuilder {
    config: WriterConfig,
    on_failure: FailureHandler,
}

impl Default for ResponseWriterBuilder {
    fn default() -> Self {
        Self {
            config: WriterConfig::default(),
            on_failure: Arc::new(plain_text_failure),
        }
    }
}

impl ResponseWriterBuilder {
    #[must_use]
    pub fn config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default `text/plain` 500 failure response.
    #[must_use]
    pub fn on_failure<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut dyn ResponseSink, &WriteError) + Send + Sync + 'static,
    {
        self.on_failure = Arc::new(handler);
        self
    }

    #[must_use]
    pub fn build(self) -> ResponseWriter {
        ResponseWriter {
            inner: Arc::new(Inner {
                config: self.config,
                schemas: SchemaCache::new(),
                on_failure: self.on_failure,
            }),
        }
    }
}

impl ResponseWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> ResponseWriterBuilder {
        ResponseWriterBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &WriterConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn schemas(&self) -> &SchemaCache {
        &self.inner.schemas
    }

    /// Validate `response` and encode it, without writing anything.
    pub fn prepare<S: Schema>(&self, response: &S) -> Result<WritePlan, WriteError> {
        let config = &self.inner.config;
        let plan = self.inner.schemas.response::<S>(config)?;

        let mut participating = 0usize;
        let mut codes: Vec<u16> = Vec::new();
        let mut headers = Vec::new();
        let mut bodies: Vec<(String, ContentKind, &dyn Slot)> = Vec::new();

        for binding in plan.bindings() {
            let Some(slot) = binding.field.slot(response) else {
                continue;
            };
            if slot.is_zero() {
                continue;
            }
            participating += 1;
            if let Status::Code(code) = binding.status {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
            match &binding.target {
                Target::Header(name) => headers.push((name.clone(), slot.value().render_text())),
                Target::Body(kind) => bodies.push((binding.field.display_path(), *kind, slot)),
            }
        }

        if participating == 0 {
            return Err(WriteError::NothingToWrite);
        }
        if codes.len() > 1 {
            return Err(WriteError::ConflictingStatusCodes(codes));
        }
        if bodies.len() > 1 {
            return Err(WriteError::ConflictingBodyFields(
                bodies.into_iter().map(|(field, ..)| field).collect(),
            ));
        }

        let body = match bodies.pop() {
            Some((field, kind, slot)) => match slot.encode(kind) {
                Ok(bytes) => Some(WriteBody {
                    content_type: config.content_type(kind).to_string(),
                    field,
                    kind,
                    bytes,
                }),
                Err(source) => return Err(WriteError::Encode { field, kind, source }),
            },
            None => None,
        };

        Ok(WritePlan {
            status: codes.first().copied().unwrap_or(config.success_status),
            headers,
            body,
        })
    }

    /// Write `response` to `sink`, or hand the failure to the failure
    /// handler. Either way the sink receives exactly one response.
    pub fn write<S: Schema>(&self, sink: &mut dyn ResponseSink, response: &S) {
        match self.prepare(response) {
            Ok(plan) => {
                debug!(
                    schema = %std::any::type_name::<S>(),
                    status = plan.status,
                    headers = plan.headers.len(),
                    body_bytes = plan.body.as_ref().map_or(0, |b| b.bytes.len()),
                    "Writing response"
                );
                plan.apply(sink);
            }
            Err(err) => {
                warn!(
                    schema = %std::any::type_name::<S>(),
                    error = %err,
                    "Response could not be written as declared"
                );
                (self.inner.on_failure)(sink, &err);
            }
        }
    }
}
