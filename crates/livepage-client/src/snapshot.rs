//! Inbound message decoding and snapshot sequencing.
//!
//! A snapshot is the complete rendering of the live region, sent as JSON.
//! Two forms are accepted:
//!
//! - a JSON string: `"<nav>…</nav><article>…</article>"`
//! - a JSON object with a sequence number: `{"seq": 7, "html": "<nav>…"}`
//!
//! The literal text `ping` is a keepalive probe, answered with `pong`.

use serde::Deserialize;

use crate::error::DecodeError;

/// Keepalive probe sent by the server.
pub const PING: &str = "ping";

/// Keepalive answer sent by the client.
pub const PONG: &str = "pong";

/// A decoded content snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Sequence number, if the server sends them.
    pub seq: Option<u64>,
    /// Replacement HTML for the live region.
    pub html: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireSnapshot {
    Html(String),
    Sequenced { seq: u64, html: String },
}

/// A decoded inbound text frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundMessage {
    /// Keepalive probe.
    Ping,
    /// Content snapshot.
    Snapshot(Snapshot),
}

impl InboundMessage {
    /// Decode an inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] if the frame is neither `ping` nor a
    /// JSON string / `{seq, html}` object.
    pub fn decode(payload: &str) -> Result<Self, DecodeError> {
        if payload == PING {
            return Ok(Self::Ping);
        }
        let snapshot = match serde_json::from_str::<WireSnapshot>(payload)? {
            WireSnapshot::Html(html) => Snapshot { seq: None, html },
            WireSnapshot::Sequenced { seq, html } => Snapshot {
                seq: Some(seq),
                html,
            },
        };
        Ok(Self::Snapshot(snapshot))
    }
}

/// Drops stale sequenced snapshots.
///
/// Tracks the highest sequence number applied on the current connection.
/// Unsequenced snapshots are always admitted (last write wins). The
/// watermark is reset on every new connection since a restarted server
/// starts counting again.
#[derive(Debug, Default)]
pub struct SnapshotSequencer {
    last: Option<u64>,
}

impl SnapshotSequencer {
    /// Returns true if a snapshot with `seq` is older than the last one applied.
    ///
    /// Unsequenced snapshots are never stale.
    #[must_use]
    pub fn is_stale(&self, seq: Option<u64>) -> bool {
        seq.zip(self.last).is_some_and(|(seq, last)| seq <= last)
    }

    /// Record that the snapshot with `seq` was applied.
    pub fn record(&mut self, seq: Option<u64>) {
        if let Some(seq) = seq {
            self.last = Some(self.last.map_or(seq, |last| last.max(seq)));
        }
    }

    /// Forget the watermark.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Highest sequence number applied so far.
    #[must_use]
    pub fn last(&self) -> Option<u64> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_json_string() {
        let message = InboundMessage::decode(r#""<div>X</div>""#).unwrap();

        assert_eq!(
            message,
            InboundMessage::Snapshot(Snapshot {
                seq: None,
                html: "<div>X</div>".to_owned()
            })
        );
    }

    #[test]
    fn test_decode_escaped_json_string() {
        let payload = serde_json::to_string("<a href=\"/x.html\">\u{e9}</a>\n").unwrap();

        let InboundMessage::Snapshot(snapshot) = InboundMessage::decode(&payload).unwrap() else {
            panic!("expected snapshot");
        };

        assert_eq!(snapshot.html, "<a href=\"/x.html\">\u{e9}</a>\n");
    }

    #[test]
    fn test_decode_sequenced() {
        let message = InboundMessage::decode(r#"{"seq": 3, "html": "<p>A</p>"}"#).unwrap();

        assert_eq!(
            message,
            InboundMessage::Snapshot(Snapshot {
                seq: Some(3),
                html: "<p>A</p>".to_owned()
            })
        );
    }

    #[test]
    fn test_decode_ping() {
        assert_eq!(InboundMessage::decode("ping").unwrap(), InboundMessage::Ping);
    }

    #[test]
    fn test_decode_malformed() {
        let err = InboundMessage::decode("<div>not json</div>").unwrap_err();

        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_decode_wrong_json_type() {
        assert!(InboundMessage::decode("42").is_err());
        assert!(InboundMessage::decode(r#"{"html": "<p/>"}"#).is_err());
    }

    #[test]
    fn test_sequencer_drops_stale() {
        let mut sequencer = SnapshotSequencer::default();
        sequencer.record(Some(1));
        sequencer.record(Some(3));

        assert!(sequencer.is_stale(Some(2)));
        assert!(sequencer.is_stale(Some(3)));
        assert!(!sequencer.is_stale(Some(4)));
        assert_eq!(sequencer.last(), Some(3));
    }

    #[test]
    fn test_sequencer_check_does_not_record() {
        let sequencer = SnapshotSequencer::default();

        assert!(!sequencer.is_stale(Some(5)));
        assert_eq!(sequencer.last(), None);
    }

    #[test]
    fn test_sequencer_admits_unsequenced() {
        let mut sequencer = SnapshotSequencer::default();
        sequencer.record(Some(10));
        sequencer.record(None);

        assert!(!sequencer.is_stale(None));
        assert_eq!(sequencer.last(), Some(10));
    }

    #[test]
    fn test_sequencer_reset() {
        let mut sequencer = SnapshotSequencer::default();
        sequencer.record(Some(10));
        sequencer.reset();

        assert!(!sequencer.is_stale(Some(1)));
    }
}
