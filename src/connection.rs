use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::channel::{channel, TokenReceiver};
use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::response::Response;
use crate::session::Session;
use crate::store::Store;
use crate::token::Token;
use crate::Error;

// Executed replies waiting for the writer.
const REPLY_QUEUE: usize = 16;

/// A client connection. Requests are decoded, executed and answered by three stages running
/// concurrently on the same task:
///
/// decoder -> token channel -> dispatcher -> reply queue -> writer
///
/// The writer is the only stage touching the sink, so replies leave in request order even when
/// the client pipelines.
pub struct Connection<R, W> {
    session: Session,
    decoder: Decoder<R>,
    encoder: Encoder<W>,
}

impl Connection<OwnedReadHalf, OwnedWriteHalf> {
    pub fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Connection::from_parts(reader, writer)
    }
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn from_parts(reader: R, writer: W) -> Self {
        Connection {
            session: Session::new(),
            decoder: Decoder::new(reader),
            encoder: Encoder::new(writer),
        }
    }

    pub fn id(&self) -> Uuid {
        self.session.id()
    }

    /// Serves requests until the client closes its side of the stream.
    ///
    /// A protocol error stops decoding, but every request decoded before it is still executed
    /// and answered before the error is returned.
    pub async fn serve(self, store: Store) -> Result<(), Error> {
        let (tx, rx) = channel();
        let (replies_tx, replies_rx) = mpsc::channel(REPLY_QUEUE);

        let (decoded, dispatched, written) = tokio::join!(
            self.decoder.run(tx),
            dispatch(rx, replies_tx, store),
            write(self.encoder, replies_rx),
        );

        // A stage only fails on its own or stops because the next one went away, so the last
        // stage holds the root cause.
        written?;
        dispatched?;
        decoded?;

        Ok(())
    }
}

async fn dispatch(
    mut rx: TokenReceiver,
    replies: mpsc::Sender<Response>,
    store: Store,
) -> Result<(), Error> {
    while let Some(parsed) = Command::read(&mut rx).await {
        let response = match parsed {
            Ok(cmd) => {
                debug!(?cmd, "executing command");
                cmd.exec(store.clone())?
            }
            Err(err) => {
                warn!(%err, "rejected request");
                Token::error(err).into()
            }
        };

        if replies.send(response).await.is_err() {
            break;
        }
    }

    Ok(())
}

async fn write<W: AsyncWrite + Unpin>(
    mut encoder: Encoder<W>,
    mut replies: mpsc::Receiver<Response>,
) -> Result<(), Error> {
    while let Some(response) = replies.recv().await {
        debug!(?response, "sending response");
        encoder.write_response(&response).await?;
    }

    Ok(())
}
