//! # Writer Module
//!
//! Turns a populated response struct into a status code, headers and at most
//! one body, emitted through a [`ResponseSink`].
//!
//! Writing is two-step: [`ResponseWriter::prepare`] validates and encodes
//! into a [`WritePlan`], and only a complete plan is applied to the sink.
//! When preparation fails the configured failure handler writes a fallback
//! response instead.
//!
//! ## Emission Order
//!
//! 1. headers, in field declaration order
//! 2. `Content-Type` and the body
//! 3. the status code
//!
//! ## Content Types
//!
//! | Kind | Default `Content-Type` |
//! |------|------------------------|
//! | `json` | `application/json;charset-UTF8` |
//! | `xml` | `application/xml;charset-UTF8` |
//! | `text` | `text/plain` |

mod core;
mod sink;

pub use core::{
    plain_text_failure, FailureHandler, ResponseWriter, ResponseWriterBuilder, WriteBody,
    WritePlan, CONTENT_TYPE,
};
pub use sink::{RecordedResponse, ResponseSink};
