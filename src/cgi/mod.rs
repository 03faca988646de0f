//! CGI support.
//!
//! [`resolver`] decides whether a request path names a script;
//! [`executor`] runs it and converts its output into a response.

pub mod executor;
pub mod resolver;

pub use executor::{CgiError, CgiExecutor};
pub use resolver::{CgiResolution, CollapsedPath, collapse_path};
