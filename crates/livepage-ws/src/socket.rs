//! Reconnecting WebSocket over tokio-tungstenite.
//!
//! [`ReconnectingSocket::spawn`] starts a background task that owns the
//! connection. It reports [`TransportEvent`]s on a channel and writes text
//! queued through the returned [`SocketHandle`]. When the connection drops
//! the task waits the backoff delay and connects again, until the attempt
//! limit is hit or the cancellation token fires.

use futures_util::{SinkExt, StreamExt};
use livepage_client::{Outbound, ReconnectPolicy, TransportError, TransportEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use url::Url;

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound half of a [`ReconnectingSocket`].
///
/// Text sent while no connection is open is discarded when the next
/// connection opens.
#[derive(Clone, Debug)]
pub struct SocketHandle {
    outbound: mpsc::UnboundedSender<String>,
}

impl Outbound for SocketHandle {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.outbound
            .send(text.to_owned())
            .map_err(|_| TransportError::Closed)
    }
}

/// A WebSocket client that reconnects with backoff.
pub struct ReconnectingSocket;

/// Why a connection ended.
enum Ended {
    /// The peer closed or the connection failed.
    Dropped,
    /// Cancelled, or every handle was dropped.
    Stopped,
}

impl ReconnectingSocket {
    /// Connect to `url` in a background task.
    ///
    /// The event channel closes when the task ends: after cancellation, once
    /// every [`SocketHandle`] is dropped, or when `policy` gives up.
    #[must_use]
    pub fn spawn(
        url: Url,
        policy: ReconnectPolicy,
        cancel: CancellationToken,
    ) -> (SocketHandle, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(run(url, policy, cancel, events_tx, outbound_rx));

        (
            SocketHandle {
                outbound: outbound_tx,
            },
            events_rx,
        )
    }
}

async fn run(
    url: Url,
    policy: ReconnectPolicy,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let mut backoff = policy.backoff();

    loop {
        tracing::debug!(url = %url, attempt = backoff.attempts(), "Connecting");
        let connected = tokio::select! {
            result = connect_async(url.as_str()) => result,
            () = cancel.cancelled() => break,
        };

        match connected {
            Ok((stream, _)) => {
                backoff.reset();
                while outbound.try_recv().is_ok() {}

                if events.send(TransportEvent::Open).is_err() {
                    break;
                }
                let ended = pump(stream, &events, &mut outbound, &cancel).await;
                let _ = events.send(TransportEvent::Close);
                if matches!(ended, Ended::Stopped) {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to connect");
            }
        }

        let Some(delay) = backoff.next_delay() else {
            tracing::warn!(attempts = backoff.attempts(), "Giving up reconnecting");
            break;
        };
        tracing::debug!(delay_ms = delay.as_millis(), "Reconnecting after delay");
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = cancel.cancelled() => break,
        }
    }

    tracing::debug!("Socket task finished");
}

/// Shuttle frames between an open connection and the channels.
async fn pump(
    stream: Stream,
    events: &mpsc::UnboundedSender<TransportEvent>,
    outbound: &mut mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
) -> Ended {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return Ended::Stopped;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if events.send(TransportEvent::Message(text.as_str().to_owned())).is_err() {
                        return Ended::Stopped;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Connection closed by server");
                    return Ended::Dropped;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Connection failed");
                    return Ended::Dropped;
                }
            },
            text = outbound.recv() => {
                let Some(text) = text else {
                    let _ = write.send(Message::Close(None)).await;
                    return Ended::Stopped;
                };
                if let Err(e) = write.send(Message::text(text)).await {
                    tracing::warn!(error = %e, "Failed to send frame");
                    return Ended::Dropped;
                }
            }
        }
    }
}
