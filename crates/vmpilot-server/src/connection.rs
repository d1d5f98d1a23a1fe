//! Per-connection handler: wire the socket to a session and run it.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;

use crate::app::AppContext;
use crate::session::Session;
use crate::transport::{read_loop, write_loop, Outbox};

const INBOUND_CAPACITY: usize = 64;

/// How long the writer may take to flush the last frames.
const WRITER_DRAIN: Duration = Duration::from_secs(5);

/// Handle a single WebSocket connection.
pub async fn handle_connection<S>(ws: WebSocketStream<S>, peer: SocketAddr, ctx: AppContext)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, stream) = ws.split();
    let (outbox, out_rx) = Outbox::channel();
    let (in_tx, in_rx) = mpsc::channel(INBOUND_CAPACITY);

    let writer = tokio::spawn(write_loop(sink, out_rx));
    let reader = tokio::spawn(read_loop(stream, in_tx, outbox.clone()));

    let session = Session::new(ctx, outbox, peer);
    let id = session.id().clone();
    session.run(in_rx).await;

    reader.abort();
    if tokio::time::timeout(WRITER_DRAIN, writer).await.is_err() {
        tracing::debug!(session = %id, "Writer did not drain in time");
    }
    tracing::debug!(session = %id, peer = %peer, "Connection closed");
}
