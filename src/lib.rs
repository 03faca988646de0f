//! sensible-server - static file and CGI HTTP server
//!
//! Core library: request parsing, dispatch, static content, CGI resolution
//! and execution.

pub mod cgi;
pub mod config;
pub mod handler;
pub mod http;
pub mod server;
