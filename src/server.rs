use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::connection::Connection;
use crate::store::Store;
use crate::Error;

/// Installs the log subscriber, binds the configured address and serves clients until Ctrl-C.
pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind(config.address()).await?;
    let store = Store::new();

    info!("Server listening on {}", listener.local_addr()?);

    tokio::select! {
        res = serve(listener, store) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}

/// Accepts connections forever, each one served on its own task against the shared store.
pub async fn serve(listener: TcpListener, store: Store) -> Result<(), Error> {
    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store).await {
                error!(error = %e, "Connection closed with error");
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, store),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
) -> Result<(), Error> {
    let conn = Connection::new(stream);

    tracing::Span::current()
        .record("connection_id", conn.id().to_string())
        .record("client_address", client_address.to_string());

    conn.serve(store).await?;

    info!("Connection closed");
    Ok(())
}
