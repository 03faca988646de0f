//! Request dispatch.
//!
//! The dispatcher maps each supported verb to its handler:
//!
//! | Method | Handler                                              |
//! |--------|------------------------------------------------------|
//! | `GET`  | CGI script when CGI is enabled and the path names one, else static file |
//! | `HEAD` | same as `GET`, body dropped                          |
//! | `BREW` | always 418                                           |
//!
//! Any other verb is a [`DispatchError::MethodNotAllowed`].

pub mod static_files;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::cgi::executor::CgiExecutor;
use crate::cgi::resolver;
use crate::config::ServerConfig;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};

/// Verbs listed in the `Allow` header of a 405.
pub const ALLOWED_METHODS: &str = "GET, HEAD, BREW";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The verb is not in the dispatch table
    MethodNotAllowed(String),
}

impl From<DispatchError> for Response {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::MethodNotAllowed(_) => Response::method_not_allowed(ALLOWED_METHODS),
        }
    }
}

/// Routes parsed requests to the handler registered for their method.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: Arc<ServerConfig>,
    cgi: Option<CgiExecutor>,
}

impl Dispatcher {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        let cgi = config
            .cgi_enabled
            .then(|| CgiExecutor::new(Arc::clone(&config)));

        Self { config, cgi }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub async fn dispatch(
        &self,
        request: &Request,
        peer: SocketAddr,
    ) -> Result<Response, DispatchError> {
        match &request.method {
            Method::GET => Ok(self.get(request, peer).await),
            Method::HEAD => Ok(self.head(request, peer).await),
            Method::BREW => Ok(brew(&request.path, &request.headers)),
            Method::Unsupported(verb) => Err(DispatchError::MethodNotAllowed(verb.clone())),
        }
    }

    async fn get(&self, request: &Request, peer: SocketAddr) -> Response {
        if let Some(response) = self.try_cgi(request, peer).await {
            return response;
        }

        static_files::get(&self.config.document_root, &request.path, &request.headers).await
    }

    async fn head(&self, request: &Request, peer: SocketAddr) -> Response {
        if let Some(response) = self.try_cgi(request, peer).await {
            return response;
        }

        static_files::head(&self.config.document_root, &request.path, &request.headers).await
    }

    async fn try_cgi(&self, request: &Request, peer: SocketAddr) -> Option<Response> {
        let executor = self.cgi.as_ref()?;
        let resolution = resolver::resolve(&request.path, &self.config.document_root).await?;

        Some(executor.execute(request, &resolution, peer).await)
    }
}

/// This server only runs on teapot hardware, so it can never brew.
pub fn brew(_path: &str, _headers: &HashMap<String, String>) -> Response {
    Response::empty(StatusCode::ImATeapot)
}
