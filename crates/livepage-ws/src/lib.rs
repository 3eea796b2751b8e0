//! Native transport for the livepage live-reload client.
//!
//! [`ReconnectingSocket`] keeps a tokio-tungstenite connection to the
//! live-reload endpoint alive with backoff. [`run_session`] feeds its events
//! into a [`LiveReloadClient`](livepage_client::LiveReloadClient) and
//! reports every applied snapshot.

mod error;
mod session;
mod socket;

pub use error::WsError;
pub use session::{SessionConfig, run_session, session_config_from_config};
pub use socket::{ReconnectingSocket, SocketHandle};
