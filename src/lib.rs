//! # tagbind
//!
//! **tagbind** binds HTTP requests to plain structs and writes plain structs
//! back as HTTP responses, driven by per-field tags.
//!
//! ## Overview
//!
//! A request struct says where each field comes from; a response struct says
//! where each field goes and which status code it implies. A generic engine
//! does the mapping at runtime, coercing text into typed values through an
//! extensible set of conversion rules.
//!
//! ```rust,ignore
//! use tagbind::{RequestBinder, ResponseWriter, Schema, Failure};
//!
//! #[derive(Default, Schema)]
//! struct GetUser {
//!     #[tag(path = "id")]
//!     id: u64,
//!     #[tag(query = "fields")]
//!     fields: Vec<String>,
//!     #[tag(header = "X-Request-Id")]
//!     request_id: Option<String>,
//! }
//!
//! #[derive(Schema)]
//! struct GetUserResponse {
//!     #[tag(body = "json")]
//!     user: Option<User>,
//!     #[tag(body = "text", code = "404")]
//!     missing: Option<String>,
//!     #[tag(body = "text")]
//!     error: Option<Failure>,
//! }
//!
//! let binder = RequestBinder::new();
//! let mut req = GetUser::default();
//! binder.bind(&mut http_request, "/users/{id}", &mut req)?;
//! ```
//!
//! ## Architecture
//!
//! - **[`reflect`]** - closed shape model, dynamic values, the [`Reflect`] and [`Slot`] traits
//! - **[`convert`]** - ordered conversion rules, [`ConversionRegistry`]
//! - **[`path`]** - `{name}` path templates, [`PathPattern`]
//! - **[`schema`]** - tag parsing and cached binding plans, [`SchemaCache`]
//! - **[`binder`]** - [`RequestBinder`] and the [`RequestSource`] collaborator
//! - **[`writer`]** - [`ResponseWriter`] and the [`ResponseSink`] collaborator
//! - **[`typed`]** - bind, call a handler, write: [`Endpoint`]
//! - **[`config`]**, **[`logging`]**, **[`error`]** - ambient settings, tracing setup, error types
//!
//! ## Tags
//!
//! Tags are declared with `#[tag(...)]` and rendered to the raw form
//! `name:"value"`. Tag values take a key followed by options:
//! `#[tag(query = "n,required")]`.
//!
//! | Tag | Request | Response |
//! |-----|---------|----------|
//! | `query` | query parameter | - |
//! | `path` | path placeholder | - |
//! | `header` | request header | response header |
//! | `body` | `json`, `xml` or `form` body | `json`, `xml` or `text` body |
//! | `code` | - | status code or `default` |

extern crate self as tagbind;

pub mod binder;
pub mod cache;
pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod logging;
pub mod path;
pub mod reflect;
pub mod schema;
pub mod typed;
pub mod writer;

pub use binder::{PathBinder, RequestBinder, RequestParts, RequestSource};
pub use codec::ContentKind;
pub use config::{load_config, BinderConfig, Config, TagNames, WriterConfig};
pub use convert::{ConversionRegistry, ConversionRule};
pub use error::{
    BindError, CodecError, ConversionError, ConversionFailure, PathError, SchemaError, WriteError,
};
pub use path::PathPattern;
pub use reflect::{Failure, RawJson, RawXml, Reflect, Shape, Slot, Value};
pub use schema::{FieldDescriptor, Location, Schema, SchemaCache, Status};
pub use tagbind_macros::{Record, Schema};
pub use typed::{Endpoint, Handler};
pub use writer::{RecordedResponse, ResponseSink, ResponseWriter, WritePlan};
