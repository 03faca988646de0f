use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::handler::Dispatcher;
use crate::http::connection::Connection;

/// Binds the configured address and serves until the task is dropped.
pub async fn run(config: Arc<ServerConfig>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.listen_addr()).await?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, config).await
}

/// Accepts connections on an already bound listener, one task per connection.
pub async fn serve(listener: TcpListener, config: Arc<ServerConfig>) -> anyhow::Result<()> {
    let dispatcher = Arc::new(Dispatcher::new(config));

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, dispatcher);
            if let Err(e) = conn.run().await {
                error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
