use std::collections::HashMap;

/// HTTP request methods.
///
/// The server dispatches `GET`, `HEAD` and `BREW`. Any other verb is kept as
/// `Unsupported` so the dispatcher can answer 405 Method Not Allowed instead
/// of treating it as a malformed request.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// BREW - Hyper Text Coffee Pot Control Protocol; always refused
    BREW,
    /// Any verb outside the dispatch table, as received
    Unsupported(String),
}

/// Represents a parsed HTTP request from a client.
///
/// Contains the request line and headers. Request bodies are never read, so
/// there is no body field.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The raw request target (e.g., "/index.html?x=1")
    pub path: String,
    /// HTTP version as sent by the client (informational only)
    pub version: String,
    /// Request headers, names kept exactly as received
    pub headers: HashMap<String, String>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Matching is case-sensitive. Unknown tokens become `Unsupported`.
    ///
    /// # Example
    ///
    /// ```
    /// # use sensible_server::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Unsupported("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "BREW" => Method::BREW,
            other => Method::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::BREW => "BREW",
            Method::Unsupported(verb) => verb,
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            headers: HashMap::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
        })
    }
}

impl Request {
    /// Retrieves a header value by its exact name.
    ///
    /// Header names are stored as received, so `"accept"` and `"Accept"`
    /// are different keys.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }
}
