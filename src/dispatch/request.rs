// src/dispatch/request.rs

/// Transport-independent view of an inbound HTTP request.
///
/// Holds only what dispatch looks at; the body is never read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    /// Correlation id carried into every log record for this request.
    pub request_id: String,
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    /// Raw `Authorization` header value, if present and valid UTF-8.
    pub authorization: Option<String>,
}

impl InboundRequest {
    pub fn new(
        request_id: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            method: method.into(),
            path: path.into(),
            query: None,
            authorization: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }
}
