//! # Schema Module
//!
//! Turns a struct's field descriptors and raw tags into a validated binding
//! plan, once per struct type.
//!
//! ## Request plans
//!
//! Each field carries at most one of the `query`, `path`, `header` and `body`
//! tags (names configurable). Untagged fields are skipped; untagged embedded
//! structs are expanded in place.
//!
//! | Tag | Key when the tag value is empty |
//! |-----|---------------------------------|
//! | `query:""` | field name in lower camel case |
//! | `path:""` | field name in lower camel case |
//! | `header:""` | field name as declared |
//! | `body:""` | content kind `json` (`xml` and `form` allowed) |
//!
//! ## Response plans
//!
//! Each field carries exactly one of `header` and `body`, plus an optional
//! `code`. Status defaults: the configured error status for `Failure`
//! fields, the configured success status otherwise.
//!
//! ## Caching
//!
//! [`SchemaCache`] memoizes plans per struct identity. Plans are immutable
//! once published and shared as `Arc`s.

mod descriptor;
mod request;
mod response;
mod tags;

pub use descriptor::{Access, FieldDescriptor, Getter, GetterMut, Schema};
pub use request::{RequestBinding, RequestPlan};
pub use response::{ResponseBinding, ResponsePlan, Status, Target};
pub use tags::{lower_camel, TagSet, TagValue};

use crate::cache::PublishCache;
use crate::config::{TagNames, WriterConfig};
use crate::error::SchemaError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Where a request value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Header,
    Query,
    Path,
    Body,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Location::Header => "header",
            Location::Query => "query",
            Location::Path => "path",
            Location::Body => "body",
        })
    }
}

type AnyPlan = dyn Any + Send + Sync;

/// Per-owner cache of request and response plans, keyed by struct identity.
#[derive(Debug)]
pub struct SchemaCache {
    requests: PublishCache<AnyPlan>,
    responses: PublishCache<AnyPlan>,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: PublishCache::new("request_schema"),
            responses: PublishCache::new("response_schema"),
        }
    }

    pub fn request<S: Schema>(&self, tags: &TagNames) -> Result<Arc<RequestPlan<S>>, SchemaError> {
        let key = <S as Schema>::shape().identity();
        let entry = self.requests.get_or_try_insert(&key, || {
            RequestPlan::<S>::build(tags).map(|plan| Arc::new(plan) as Arc<AnyPlan>)
        })?;
        match entry.downcast::<RequestPlan<S>>() {
            Ok(plan) => Ok(plan),
            Err(_) => {
                warn!(identity = %key, "Cached request plan has another type, rebuilding");
                RequestPlan::build(tags).map(Arc::new)
            }
        }
    }

    pub fn response<S: Schema>(
        &self,
        config: &WriterConfig,
    ) -> Result<Arc<ResponsePlan<S>>, SchemaError> {
        let key = <S as Schema>::shape().identity();
        let entry = self.responses.get_or_try_insert(&key, || {
            ResponsePlan::<S>::build(config).map(|plan| Arc::new(plan) as Arc<AnyPlan>)
        })?;
        match entry.downcast::<ResponsePlan<S>>() {
            Ok(plan) => Ok(plan),
            Err(_) => {
                warn!(identity = %key, "Cached response plan has another type, rebuilding");
                ResponsePlan::build(config).map(Arc::new)
            }
        }
    }

    /// Number of cached request plans.
    #[must_use]
    pub fn request_plans(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn response_plans(&self) -> usize {
        self.responses.len()
    }
}

#[cfg(test)]
mod tests;
