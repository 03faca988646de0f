//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.1 subset the server speaks: one request
//! per connection, no request bodies.
//!
//! # Architecture
//!
//! - **`connection`**: Per-connection handler driving the read/process/write state machine
//! - **`parser`**: Parses the request line and headers from a bounded byte buffer
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: Content type resolution and `Accept` negotiation
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Read up to MAX_REQUEST_SIZE bytes
//!        └──────┬──────┘
//!               │ Header block received (or input ended)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Parse, dispatch, map errors to 400/405
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!            Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sensible_server::config::ServerConfig;
//! use sensible_server::handler::Dispatcher;
//! use sensible_server::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(ServerConfig::new("/srv/www", false)?);
//!     let dispatcher = Arc::new(Dispatcher::new(config));
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let dispatcher = dispatcher.clone();
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, peer, dispatcher);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;
pub mod mime;
