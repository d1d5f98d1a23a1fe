//! WebSocket transport tasks.
//!
//! A reader task turns socket frames into `Inbound` events and a writer
//! task drains an unbounded outbox, so streaming output never waits on
//! client input and vice versa.

use std::fmt::Display;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, warn};

use crate::protocol::ServerFrame;

/// What the session sees of the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Text(String),
    /// A frame that can never be valid, e.g. binary.
    Malformed(String),
    Closed,
}

#[derive(Debug)]
pub enum Outbound {
    Frame(ServerFrame),
    /// Protocol-level frames such as pongs.
    Control(Message),
}

/// Cloneable handle for queueing frames to the client.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Outbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a frame. Returns false once the writer is gone.
    pub fn send(&self, frame: ServerFrame) -> bool {
        self.tx.send(Outbound::Frame(frame)).is_ok()
    }

    pub fn control(&self, message: Message) -> bool {
        self.tx.send(Outbound::Control(message)).is_ok()
    }
}

/// Forward socket frames to the session until the socket closes.
pub async fn read_loop<S>(mut stream: S, inbound: mpsc::Sender<Inbound>, outbox: Outbox)
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        let event = match frame {
            Ok(Message::Text(text)) => Inbound::Text(text.to_string()),
            Ok(Message::Binary(_)) => Inbound::Malformed("binary frames are not supported".into()),
            Ok(Message::Ping(data)) => {
                outbox.control(Message::Pong(data));
                continue;
            }
            Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!(error = %e, "WS read error");
                break;
            }
        };
        if inbound.send(event).await.is_err() {
            return;
        }
    }
    let _ = inbound.send(Inbound::Closed).await;
}

/// Write queued frames to the socket. Stops after the terminal frame,
/// which is followed by a close frame.
pub async fn write_loop<S>(mut sink: S, mut outbound: mpsc::UnboundedReceiver<Outbound>)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(item) = outbound.recv().await {
        match item {
            Outbound::Frame(frame) => {
                let terminal = frame.is_terminal();
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize frame");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    debug!(error = %e, "WS write failed");
                    return;
                }
                if terminal {
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                }
            }
            Outbound::Control(message) => {
                if sink.send(message).await.is_err() {
                    return;
                }
            }
        }
    }
    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TerminateReason;

    #[tokio::test]
    async fn reader_maps_frames() {
        let frames = futures_util::stream::iter(vec![
            Ok(Message::Text("{\"message\":\"hi\"}".into())),
            Ok(Message::Ping(vec![1u8, 2].into())),
            Ok(Message::Binary(vec![0u8].into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("ignored".into())),
        ]);
        let (tx, mut rx) = mpsc::channel(8);
        let (outbox, mut out_rx) = Outbox::channel();

        read_loop(frames, tx, outbox).await;

        assert_eq!(rx.recv().await, Some(Inbound::Text("{\"message\":\"hi\"}".into())));
        assert!(matches!(rx.recv().await, Some(Inbound::Malformed(_))));
        assert_eq!(rx.recv().await, Some(Inbound::Closed));
        assert!(matches!(
            out_rx.recv().await,
            Some(Outbound::Control(Message::Pong(_)))
        ));
    }

    #[tokio::test]
    async fn reader_reports_closed_at_end_of_stream() {
        let frames = futures_util::stream::iter(Vec::<Result<Message, WsError>>::new());
        let (tx, mut rx) = mpsc::channel(8);
        let (outbox, _out_rx) = Outbox::channel();
        read_loop(frames, tx, outbox).await;
        assert_eq!(rx.recv().await, Some(Inbound::Closed));
    }

    #[tokio::test]
    async fn writer_stops_after_terminal_frame() {
        let (outbox, rx) = Outbox::channel();
        outbox.send(ServerFrame::status("Deploying instance"));
        outbox.send(ServerFrame::Terminated {
            reason: TerminateReason::IdleTimeout,
            message: None,
        });
        outbox.send(ServerFrame::status("never written"));

        let mut written: Vec<Message> = Vec::new();
        write_loop(&mut written, rx).await;

        assert_eq!(written.len(), 3);
        let Message::Text(first) = &written[0] else {
            panic!("expected text frame");
        };
        assert!(first.as_str().contains("\"type\":\"status\""));
        assert!(matches!(written[1], Message::Text(_)));
        assert!(matches!(written[2], Message::Close(None)));
    }

    #[tokio::test]
    async fn writer_ends_when_senders_drop() {
        let (outbox, rx) = Outbox::channel();
        outbox.send(ServerFrame::loop_complete());
        drop(outbox);

        let mut written: Vec<Message> = Vec::new();
        write_loop(&mut written, rx).await;
        assert_eq!(written.len(), 1);
    }
}
