//! The seam between the client and a concrete WebSocket.

/// Something that happened on the socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established.
    Open,
    /// A text frame arrived.
    Message(String),
    /// The connection was closed or failed.
    Close,
}

/// Failure writing to the socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The socket is not open.
    #[error("Connection closed")]
    Closed,
    /// The socket rejected the frame.
    #[error("Failed to send frame: {0}")]
    Send(String),
}

/// Outbound half of a socket.
pub trait Outbound {
    /// Queue a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the frame cannot be sent.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;
}

impl Outbound for Vec<String> {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.push(text.to_owned());
        Ok(())
    }
}
