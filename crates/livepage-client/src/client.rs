//! The event-driven live-reload client.
//!
//! [`LiveReloadClient`] owns the page DOM and reacts to [`TransportEvent`]s
//! fed to it by a transport. It does not own the socket: replies go through
//! the [`Outbound`] passed to each call, so the same client runs over a
//! tokio-tungstenite task natively and over `web_sys::WebSocket` in the
//! browser.

use livepage_dom::{Document, LiveDom, NodeShape, VElement, apply, diff, parse_fragment};

use crate::endpoint::DEFAULT_ENDPOINT_PATH;
use crate::error::{ClientError, DecodeError};
use crate::identity::{DEFAULT_IDENTITY_ATTRIBUTE, IdentityToken};
use crate::reconnect::ReconnectPolicy;
use crate::snapshot::{InboundMessage, PONG, Snapshot, SnapshotSequencer};
use crate::status::{StatusIndicator, StatusSettings};
use crate::transport::{Outbound, TransportEvent};

/// Default id of the live region.
pub const DEFAULT_CONTAINER_ID: &str = "NavAndArticle";

/// Client settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientSettings {
    /// Id of the element whose children are replaced by snapshots.
    pub container_id: String,
    /// `<head>` attribute carrying the identity token.
    pub identity_attribute: String,
    /// Path of the WebSocket endpoint.
    pub endpoint_path: String,
    /// Status indicator hooks.
    pub status: StatusSettings,
    /// Reconnect backoff.
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            container_id: DEFAULT_CONTAINER_ID.to_owned(),
            identity_attribute: DEFAULT_IDENTITY_ATTRIBUTE.to_owned(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_owned(),
            status: StatusSettings::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Page nodes the client works with, looked up once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct PageNodes<N> {
    /// The live region.
    pub container: N,
    /// The document head.
    pub head: Option<N>,
    /// Status panel.
    pub status_panel: Option<N>,
    /// Status icon.
    pub status_icon: Option<N>,
}

impl PageNodes<livepage_dom::NodeId> {
    /// Locate the page nodes in an in-memory document.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ContainerNotFound`] if the live region is missing.
    pub fn locate(doc: &Document, settings: &ClientSettings) -> Result<Self, ClientError> {
        let container = doc
            .get_element_by_id(&settings.container_id)
            .ok_or_else(|| ClientError::ContainerNotFound(settings.container_id.clone()))?;
        Ok(Self {
            container,
            head: doc.find_element("head"),
            status_panel: doc.get_element_by_id(&settings.status.panel_id),
            status_icon: doc.get_element_by_id(&settings.status.icon_id),
        })
    }
}

/// Connection lifecycle as seen by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has opened yet.
    Connecting,
    /// Connected.
    Open,
    /// Disconnected; the transport may be reconnecting.
    Closed,
}

impl ConnectionState {
    /// Lowercase name, for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// What handling an event did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// Connection opened and the identity token was sent.
    Announced(String),
    /// Open event on a connection that is already open; nothing sent.
    AlreadyOpen,
    /// A snapshot was applied to the live region.
    Applied {
        /// Number of DOM patches.
        patches: usize,
    },
    /// A sequenced snapshot older than the last applied one was dropped.
    Stale {
        /// Sequence number of the dropped snapshot.
        seq: u64,
    },
    /// A keepalive probe was answered.
    Pong,
    /// Connection closed.
    Disconnected,
}

/// Live-reload client over a DOM `D`.
pub struct LiveReloadClient<D: LiveDom> {
    dom: D,
    nodes: PageNodes<D::Node>,
    settings: ClientSettings,
    status: StatusIndicator<D::Node>,
    state: ConnectionState,
    sequencer: SnapshotSequencer,
}

impl<D: LiveDom> LiveReloadClient<D> {
    /// Create a client over `dom` using the located `nodes`.
    #[must_use]
    pub fn new(dom: D, nodes: PageNodes<D::Node>, settings: ClientSettings) -> Self {
        let status = StatusIndicator::new(
            nodes.status_panel.clone(),
            nodes.status_icon.clone(),
            settings.status.clone(),
        );
        Self {
            dom,
            nodes,
            settings,
            status,
            state: ConnectionState::Connecting,
            sequencer: SnapshotSequencer::default(),
        }
    }

    /// Dispatch a transport event.
    ///
    /// # Errors
    ///
    /// Returns the error of the dispatched handler. None of them change the
    /// connection state on failure.
    pub fn handle(
        &mut self,
        event: TransportEvent,
        out: &mut impl Outbound,
    ) -> Result<EventOutcome, ClientError> {
        match event {
            TransportEvent::Open => self.on_open(out),
            TransportEvent::Message(payload) => self.on_message(&payload, out),
            TransportEvent::Close => self.on_close(),
        }
    }

    /// Connection opened: show connected and announce the page identity.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingIdentity`] if the head carries no token
    /// (the connection stays open, nothing is sent), or a DOM/transport error.
    pub fn on_open(&mut self, out: &mut impl Outbound) -> Result<EventOutcome, ClientError> {
        if self.state == ConnectionState::Open {
            tracing::debug!("Open event on an open connection, not announcing again");
            return Ok(EventOutcome::AlreadyOpen);
        }
        self.state = ConnectionState::Open;
        self.status.show_connected(&mut self.dom)?;

        let token = IdentityToken::read(
            &self.dom,
            self.nodes.head.as_ref(),
            &self.settings.identity_attribute,
        )?;
        out.send_text(token.as_str())?;
        tracing::info!(identity = %token, "Connected, announced page identity");
        Ok(EventOutcome::Announced(token.to_string()))
    }

    /// Text frame received: answer a ping, or apply a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] for a malformed payload; the client
    /// stays ready for the next message.
    pub fn on_message(
        &mut self,
        payload: &str,
        out: &mut impl Outbound,
    ) -> Result<EventOutcome, ClientError> {
        match InboundMessage::decode(payload)? {
            InboundMessage::Ping => {
                out.send_text(PONG)?;
                Ok(EventOutcome::Pong)
            }
            InboundMessage::Snapshot(snapshot) => self.apply_snapshot(snapshot),
        }
    }

    /// Connection closed: show disconnected and forget per-connection state.
    ///
    /// # Errors
    ///
    /// Returns a DOM error if the status icon cannot be updated.
    pub fn on_close(&mut self) -> Result<EventOutcome, ClientError> {
        self.state = ConnectionState::Closed;
        self.sequencer.reset();
        self.status.show_disconnected(&mut self.dom)?;
        tracing::info!("Disconnected");
        Ok(EventOutcome::Disconnected)
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) -> Result<EventOutcome, ClientError> {
        if let Some(seq) = snapshot.seq
            && self.sequencer.is_stale(Some(seq))
        {
            tracing::debug!(seq, last = ?self.sequencer.last(), "Dropping stale snapshot");
            return Ok(EventOutcome::Stale { seq });
        }

        let children =
            parse_fragment(&snapshot.html).map_err(|e| DecodeError::Html(format!("{e:?}")))?;
        let tag = match self.dom.shape(&self.nodes.container) {
            NodeShape::Element { tag, .. } => tag,
            _ => "div".to_owned(),
        };
        let proposed = VElement::new(&tag)
            .with_attribute("id", &self.settings.container_id)
            .with_children(children);

        let patches = diff(&self.dom, &self.nodes.container, &proposed);
        let count = patches.len();
        apply(&mut self.dom, patches)?;
        self.sequencer.record(snapshot.seq);
        tracing::debug!(patches = count, seq = ?snapshot.seq, "Applied snapshot");
        Ok(EventOutcome::Applied { patches: count })
    }

    /// The DOM.
    #[must_use]
    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// The DOM, mutably.
    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    /// The live region node.
    #[must_use]
    pub fn container(&self) -> &D::Node {
        &self.nodes.container
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Settings the client was built with.
    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use livepage_dom::{DomError, NodeId, VNode};
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head data-article-dst-filename="hello.html"><title>Hello</title></head><body><div id="websocket" style="display: none"><span id="websocketStatus" class="glyphicon glyphicon-remove"></span></div><div id="NavAndArticle"><nav><a href="/">Home</a></nav><article><h1>Hello</h1><p>First</p></article></div></body></html>"#;

    fn client() -> LiveReloadClient<Document> {
        client_for(PAGE)
    }

    fn client_for(page: &str) -> LiveReloadClient<Document> {
        let doc = Document::parse(page).unwrap();
        let settings = ClientSettings::default();
        let nodes = PageNodes::locate(&doc, &settings).unwrap();
        LiveReloadClient::new(doc, nodes, settings)
    }

    fn region(client: &LiveReloadClient<Document>) -> String {
        client.dom().inner_html(*client.container())
    }

    fn icon_class(client: &LiveReloadClient<Document>) -> String {
        let icon = client.dom().get_element_by_id("websocketStatus").unwrap();
        client.dom().attribute(&icon, "class").unwrap()
    }

    fn snapshot(html: &str) -> TransportEvent {
        TransportEvent::Message(serde_json::to_string(html).unwrap())
    }

    struct ClosedSocket;

    impl Outbound for ClosedSocket {
        fn send_text(&mut self, _text: &str) -> Result<(), TransportError> {
            Err(TransportError::Closed)
        }
    }

    #[test]
    fn test_open_announces_identity() {
        let mut client = client();
        let mut sent = Vec::new();

        let outcome = client.handle(TransportEvent::Open, &mut sent).unwrap();

        assert_eq!(outcome, EventOutcome::Announced("hello.html".to_owned()));
        assert_eq!(sent, vec!["hello.html".to_owned()]);
        assert_eq!(client.state(), ConnectionState::Open);
    }

    #[test]
    fn test_identity_read_when_open_fires() {
        let mut client = client();
        let head = client.dom().find_element("head").unwrap();
        client
            .dom_mut()
            .set_attribute(&head, DEFAULT_IDENTITY_ATTRIBUTE, "renamed.html")
            .unwrap();
        let mut sent = Vec::new();

        client.handle(TransportEvent::Open, &mut sent).unwrap();

        assert_eq!(sent, vec!["renamed.html".to_owned()]);
    }

    #[test]
    fn test_one_announcement_per_connection() {
        let mut client = client();
        let mut sent = Vec::new();

        client.handle(TransportEvent::Open, &mut sent).unwrap();
        let second = client.handle(TransportEvent::Open, &mut sent).unwrap();
        client.handle(TransportEvent::Close, &mut sent).unwrap();
        client.handle(TransportEvent::Open, &mut sent).unwrap();

        assert_eq!(second, EventOutcome::AlreadyOpen);
        assert_eq!(sent, vec!["hello.html".to_owned(), "hello.html".to_owned()]);
    }

    #[test]
    fn test_missing_identity_keeps_connection() {
        let mut client = client_for(
            r#"<html><head></head><body><div id="NavAndArticle"></div></body></html>"#,
        );
        let mut sent = Vec::new();

        let err = client.handle(TransportEvent::Open, &mut sent).unwrap_err();

        assert!(matches!(err, ClientError::MissingIdentity { .. }));
        assert!(sent.is_empty());
        assert_eq!(client.state(), ConnectionState::Open);
    }

    #[test]
    fn test_send_failure_is_reported() {
        let mut client = client();

        let err = client.handle(TransportEvent::Open, &mut ClosedSocket).unwrap_err();

        assert!(matches!(err, ClientError::Transport(TransportError::Closed)));
    }

    #[test]
    fn test_snapshot_replaces_region() {
        let mut client = client();
        let mut sent = Vec::new();
        client.handle(TransportEvent::Open, &mut sent).unwrap();

        let outcome = client.handle(snapshot("<div>X</div>"), &mut sent).unwrap();

        assert!(matches!(outcome, EventOutcome::Applied { .. }));
        assert_eq!(region(&client), "<div>X</div>");
    }

    #[test]
    fn test_unchanged_nodes_keep_identity() {
        let mut client = client();
        let mut sent = Vec::new();
        let nav: NodeId = client.dom().find_element("nav").unwrap();
        let h1: NodeId = client.dom().find_element("h1").unwrap();

        client
            .handle(
                snapshot(
                    r#"<nav><a href="/">Home</a></nav><article><h1>Hello</h1><p>Second</p></article>"#,
                ),
                &mut sent,
            )
            .unwrap();

        assert_eq!(
            region(&client),
            r#"<nav><a href="/">Home</a></nav><article><h1>Hello</h1><p>Second</p></article>"#
        );
        assert!(client.dom().is_attached(nav));
        assert!(client.dom().is_attached(h1));
        assert_eq!(client.dom().find_element("nav"), Some(nav));
    }

    #[test]
    fn test_last_write_wins() {
        let mut client = client();
        let mut sent = Vec::new();

        client.handle(snapshot("<p>A</p>"), &mut sent).unwrap();
        client.handle(snapshot("<p>B</p>"), &mut sent).unwrap();

        assert_eq!(region(&client), "<p>B</p>");
    }

    #[test]
    fn test_status_follows_connection() {
        let mut client = client();
        let mut sent = Vec::new();

        client.handle(TransportEvent::Open, &mut sent).unwrap();
        assert_eq!(icon_class(&client), "glyphicon glyphicon-ok");
        let panel = client.dom().get_element_by_id("websocket").unwrap();
        assert_eq!(
            client.dom().attribute(&panel, "style").unwrap(),
            "display: block"
        );

        client.handle(TransportEvent::Close, &mut sent).unwrap();
        assert_eq!(icon_class(&client), "glyphicon glyphicon-remove");
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_malformed_payload_keeps_connection() {
        let mut client = client();
        let mut sent = Vec::new();
        client.handle(TransportEvent::Open, &mut sent).unwrap();

        let err = client
            .handle(TransportEvent::Message("{not json".to_owned()), &mut sent)
            .unwrap_err();
        client.handle(snapshot("<p>after</p>"), &mut sent).unwrap();

        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(client.state(), ConnectionState::Open);
        assert_eq!(region(&client), "<p>after</p>");
    }

    #[test]
    fn test_ping_is_answered() {
        let mut client = client();
        let mut sent = Vec::new();

        let outcome = client
            .handle(TransportEvent::Message("ping".to_owned()), &mut sent)
            .unwrap();

        assert_eq!(outcome, EventOutcome::Pong);
        assert_eq!(sent, vec!["pong".to_owned()]);
    }

    #[test]
    fn test_stale_snapshot_dropped() {
        let mut client = client();
        let mut sent = Vec::new();

        client
            .handle(
                TransportEvent::Message(r#"{"seq": 2, "html": "<p>two</p>"}"#.to_owned()),
                &mut sent,
            )
            .unwrap();
        let outcome = client
            .handle(
                TransportEvent::Message(r#"{"seq": 1, "html": "<p>one</p>"}"#.to_owned()),
                &mut sent,
            )
            .unwrap();

        assert_eq!(outcome, EventOutcome::Stale { seq: 1 });
        assert_eq!(region(&client), "<p>two</p>");
    }

    /// Document whose insertions can be made to fail.
    struct FlakyDom {
        inner: Document,
        fail_inserts: bool,
    }

    impl LiveDom for FlakyDom {
        type Node = NodeId;

        fn children(&self, node: &NodeId) -> Vec<NodeId> {
            self.inner.children(node)
        }

        fn shape(&self, node: &NodeId) -> NodeShape {
            self.inner.shape(node)
        }

        fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
            self.inner.set_attribute(node, name, value)
        }

        fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), DomError> {
            self.inner.remove_attribute(node, name)
        }

        fn set_text(&mut self, node: &NodeId, text: &str) -> Result<(), DomError> {
            self.inner.set_text(node, text)
        }

        fn create(&mut self, vnode: &VNode) -> Result<NodeId, DomError> {
            self.inner.create(vnode)
        }

        fn insert_before(
            &mut self,
            parent: &NodeId,
            child: &NodeId,
            reference: Option<&NodeId>,
        ) -> Result<(), DomError> {
            if self.fail_inserts {
                return Err(DomError::Host("insert rejected".to_owned()));
            }
            self.inner.insert_before(parent, child, reference)
        }

        fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
            self.inner.remove_child(parent, child)
        }

        fn replace_child(&mut self, parent: &NodeId, new: &NodeId, old: &NodeId) -> Result<(), DomError> {
            self.inner.replace_child(parent, new, old)
        }
    }

    #[test]
    fn test_failed_snapshot_can_be_resent() {
        let doc = Document::parse(PAGE).unwrap();
        let settings = ClientSettings::default();
        let nodes = PageNodes::locate(&doc, &settings).unwrap();
        let dom = FlakyDom {
            inner: doc,
            fail_inserts: true,
        };
        let mut client = LiveReloadClient::new(dom, nodes, settings);
        let mut sent = Vec::new();
        let message = r#"{"seq": 1, "html": "<nav><a href=\"/\">Home</a></nav><article><h1>Hello</h1><p>First</p><p>Second</p></article>"}"#;

        let err = client
            .handle(TransportEvent::Message(message.to_owned()), &mut sent)
            .unwrap_err();
        assert!(matches!(err, ClientError::Dom(_)));

        client.dom_mut().fail_inserts = false;
        let outcome = client
            .handle(TransportEvent::Message(message.to_owned()), &mut sent)
            .unwrap();

        assert_eq!(outcome, EventOutcome::Applied { patches: 1 });
        assert_eq!(
            client.dom().inner.inner_html(*client.container()),
            r#"<nav><a href="/">Home</a></nav><article><h1>Hello</h1><p>First</p><p>Second</p></article>"#
        );
    }

    #[test]
    fn test_sequence_resets_on_reconnect() {
        let mut client = client();
        let mut sent = Vec::new();
        client.handle(TransportEvent::Open, &mut sent).unwrap();
        client
            .handle(
                TransportEvent::Message(r#"{"seq": 9, "html": "<p>nine</p>"}"#.to_owned()),
                &mut sent,
            )
            .unwrap();

        client.handle(TransportEvent::Close, &mut sent).unwrap();
        client.handle(TransportEvent::Open, &mut sent).unwrap();
        client
            .handle(
                TransportEvent::Message(r#"{"seq": 1, "html": "<p>one</p>"}"#.to_owned()),
                &mut sent,
            )
            .unwrap();

        assert_eq!(region(&client), "<p>one</p>");
    }

    #[test]
    fn test_container_attributes_untouched() {
        let mut client = client_for(
            r#"<html><head data-article-dst-filename="a.html"></head><body><div id="NavAndArticle" class="wide"></div></body></html>"#,
        );
        let mut sent = Vec::new();

        client.handle(snapshot("<p>x</p>"), &mut sent).unwrap();

        let container = *client.container();
        assert_eq!(
            client.dom().attribute(&container, "class").as_deref(),
            Some("wide")
        );
    }

    #[test]
    fn test_locate_missing_container() {
        let doc = Document::parse("<html><head></head><body></body></html>").unwrap();

        let err = PageNodes::locate(&doc, &ClientSettings::default()).unwrap_err();

        assert!(matches!(err, ClientError::ContainerNotFound(ref id) if id == "NavAndArticle"));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ConnectionState::Connecting.as_str(), "connecting");
        assert_eq!(ConnectionState::Open.as_str(), "open");
        assert_eq!(ConnectionState::Closed.as_str(), "closed");
    }
}
