use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use tracing::warn;

/// The response side the writer emits into.
///
/// [`ResponseWriter`](super::ResponseWriter) always calls `set_header` for
/// every header first, then `write_body` at most once, then `set_status`
/// exactly once.
pub trait ResponseSink {
    /// Set a header, replacing any earlier value of the same name.
    fn set_header(&mut self, name: &str, value: &str);

    fn write_body(&mut self, bytes: &[u8]);

    fn set_status(&mut self, status: u16);
}

impl ResponseSink for http::Response<Vec<u8>> {
    fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "Skipping header that is not valid HTTP"),
        }
    }

    fn write_body(&mut self, bytes: &[u8]) {
        self.body_mut().extend_from_slice(bytes);
    }

    fn set_status(&mut self, status: u16) {
        match StatusCode::from_u16(status) {
            Ok(code) => *self.status_mut() = code,
            Err(_) => warn!(status, "Skipping status code that is not valid HTTP"),
        }
    }
}

/// An owned record of everything written to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedResponse {
    /// `None` until a status is set
    pub status: Option<u16>,
    /// Headers in the order they were first set
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text, lossily decoded.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Convert into an [`http::Response`]; an unset status becomes 200.
    pub fn into_http(self) -> Result<http::Response<Vec<u8>>, http::Error> {
        let mut builder = http::Response::builder().status(self.status.unwrap_or(200));
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(self.body)
    }
}

impl ResponseSink for RecordedResponse {
    fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn write_body(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }
}
