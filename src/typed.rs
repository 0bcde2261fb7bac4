//! # Typed Endpoints
//!
//! Glue for the common case: bind a request struct, call a handler, write
//! the response struct.
//!
//! ```rust,ignore
//! let endpoint = Endpoint::new(&binder, writer, "/users/{id}", |req: GetUser| {
//!     GetUserResponse { user: lookup(req.id), ..Default::default() }
//! })?;
//! endpoint.serve(&mut request, &mut response)?;
//! ```
//!
//! A request that fails to bind never reaches the handler; it is answered
//! with a `text/plain` 400 carrying the bind error.

use crate::binder::{PathBinder, RequestBinder, RequestSource};
use crate::config::DEFAULT_TEXT_CONTENT_TYPE;
use crate::error::{BindError, PathError};
use crate::schema::Schema;
use crate::writer::{ResponseSink, ResponseWriter, CONTENT_TYPE};
use std::marker::PhantomData;
use tracing::debug;

/// Status written when the request cannot be bound.
pub const BIND_FAILURE_STATUS: u16 = 400;

/// Turns a bound request into a response.
///
/// Implemented for every `Fn(Req) -> Resp`.
pub trait Handler<Req, Resp>: Send + Sync {
    fn handle(&self, req: Req) -> Resp;
}

impl<F, Req, Resp> Handler<Req, Resp> for F
where
    F: Fn(Req) -> Resp + Send + Sync,
{
    fn handle(&self, req: Req) -> Resp {
        self(req)
    }
}

/// A handler bound to a path template, a binder and a writer.
pub struct Endpoint<Req, Resp, H> {
    binder: PathBinder,
    writer: ResponseWriter,
    handler: H,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp, H> std::fmt::Debug for Endpoint<Req, Resp, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("template", &self.binder.template())
            .field("request", &std::any::type_name::<Req>())
            .field("response", &std::any::type_name::<Resp>())
            .finish_non_exhaustive()
    }
}

impl<Req, Resp, H> Endpoint<Req, Resp, H>
where
    Req: Schema + Default,
    Resp: Schema,
    H: Handler<Req, Resp>,
{
    /// Compiles `template` up front; an invalid template is reported here
    /// rather than on the first request.
    pub fn new(
        binder: &RequestBinder,
        writer: ResponseWriter,
        template: &str,
        handler: H,
    ) -> Result<Self, PathError> {
        Ok(Self {
            binder: binder.with_path(template)?,
            writer,
            handler,
            _types: PhantomData,
        })
    }

    #[must_use]
    pub fn template(&self) -> &str {
        self.binder.template()
    }

    /// Serve one request.
    ///
    /// The sink always receives a complete response. A bind error is also
    /// returned so the caller can log or count it.
    pub fn serve<R>(&self, source: &mut R, sink: &mut dyn ResponseSink) -> Result<(), BindError>
    where
        R: RequestSource + ?Sized,
    {
        let mut req = Req::default();
        if let Err(err) = self.binder.bind(source, &mut req) {
            sink.set_header(CONTENT_TYPE, DEFAULT_TEXT_CONTENT_TYPE);
            sink.write_body(err.to_string().as_bytes());
            sink.set_status(BIND_FAILURE_STATUS);
            return Err(err);
        }
        debug!(template = %self.template(), "Request bound, calling handler");
        let resp = self.handler.handle(req);
        self.writer.write(sink, &resp);
        Ok(())
    }
}
