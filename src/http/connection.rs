use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::handler::{DispatchError, Dispatcher};
use crate::http::parser::{MAX_REQUEST_SIZE, find_headers_end, parse_http_request, parse_request_line};
use crate::http::request::Method;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    buffer: BytesMut,
    dispatcher: Arc<Dispatcher>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing,
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(MAX_REQUEST_SIZE),
            dispatcher,
            state: ConnectionState::Reading,
        }
    }

    /// Serves exactly one request, then closes.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    let read_timeout = self.dispatcher.config().read_timeout;
                    if self.read_request(read_timeout).await? {
                        self.state = ConnectionState::Processing;
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Processing => {
                    let response = self.respond().await;
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.stream.shutdown().await.ok();
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads the request bytes, giving up after `read_timeout` if one is set.
    ///
    /// Returns `false` when the client closed without sending anything.
    async fn read_request(&mut self, read_timeout: Option<Duration>) -> anyhow::Result<bool> {
        match read_timeout {
            Some(limit) => match timeout(limit, self.fill_buffer()).await {
                Ok(result) => result?,
                Err(_) => warn!(peer = %self.peer, "Timed out waiting for request"),
            },
            None => self.fill_buffer().await?,
        }

        Ok(!self.buffer.is_empty())
    }

    /// Reads until the header block is complete, the peer stops sending, or
    /// `MAX_REQUEST_SIZE` bytes have arrived.
    async fn fill_buffer(&mut self) -> std::io::Result<()> {
        while self.buffer.len() < MAX_REQUEST_SIZE && find_headers_end(&self.buffer).is_none() {
            let remaining = MAX_REQUEST_SIZE - self.buffer.len();
            let mut chunk = (&mut self.stream).take(remaining as u64);

            if chunk.read_buf(&mut self.buffer).await? == 0 {
                break;
            }
        }

        Ok(())
    }

    /// Parses the buffered bytes and produces the response for them.
    ///
    /// Every failure becomes an error response here.
    async fn respond(&self) -> Response {
        let request = match parse_http_request(&self.buffer) {
            Ok(request) => request,
            Err(e) => {
                // An unknown verb is refused even when the headers are broken
                if let Ok((Method::Unsupported(verb), path, _)) = parse_request_line(&self.buffer) {
                    warn!(peer = %self.peer, method = %verb, path, error = ?e, "Unsupported method");
                    return Response::from(DispatchError::MethodNotAllowed(verb));
                }

                warn!(peer = %self.peer, error = ?e, "Bad request");
                return Response::bad_request();
            }
        };

        let response = match self.dispatcher.dispatch(&request, self.peer).await {
            Ok(response) => response,
            Err(e) => Response::from(e),
        };

        info!(
            peer = %self.peer,
            method = request.method.as_str(),
            path = %request.path,
            version = %request.version,
            status = response.status.as_u16(),
            "Serviced request"
        );

        response
    }
}
