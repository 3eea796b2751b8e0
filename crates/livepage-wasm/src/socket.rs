//! Reconnecting `web_sys::WebSocket` driving the live-reload client.

use std::cell::RefCell;
use std::rc::Rc;

use livepage_client::{
    Backoff, ClientError, LiveReloadClient, Outbound, TransportError, TransportEvent,
};
use wasm_bindgen::prelude::*;
use web_sys::{MessageEvent, WebSocket};

use crate::dom::BrowserDom;

/// Closures retained so the browser can call them.
#[derive(Default)]
struct Callbacks {
    _on_open: Option<Closure<dyn FnMut()>>,
    _on_message: Option<Closure<dyn FnMut(MessageEvent)>>,
    _on_close: Option<Closure<dyn FnMut()>>,
    _on_error: Option<Closure<dyn FnMut()>>,
}

/// State shared by the socket callbacks and the reconnect timer.
struct Session {
    url: String,
    client: RefCell<LiveReloadClient<BrowserDom>>,
    ws: RefCell<WebSocket>,
    backoff: RefCell<Backoff>,
    callbacks: RefCell<Callbacks>,
}

struct SocketOutbound(WebSocket);

impl Outbound for SocketOutbound {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        if self.0.ready_state() != WebSocket::OPEN {
            return Err(TransportError::Closed);
        }
        self.0
            .send_with_str(text)
            .map_err(|e| TransportError::Send(format!("{e:?}")))
    }
}

/// Open the socket and keep it connected.
///
/// The callbacks hold the session, so it lives as long as the page.
pub(crate) fn connect(
    url: &str,
    client: LiveReloadClient<BrowserDom>,
) -> Result<(), JsValue> {
    let backoff = client.settings().reconnect.backoff();
    let ws = WebSocket::new(url)?;
    let session = Rc::new(Session {
        url: url.to_owned(),
        client: RefCell::new(client),
        ws: RefCell::new(ws),
        backoff: RefCell::new(backoff),
        callbacks: RefCell::new(Callbacks::default()),
    });
    install_callbacks(&session);
    Ok(())
}

fn dispatch(session: &Session, event: TransportEvent) {
    let mut out = SocketOutbound(session.ws.borrow().clone());
    match session.client.borrow_mut().handle(event, &mut out) {
        Ok(outcome) => tracing::debug!(?outcome, "Handled event"),
        Err(e @ ClientError::Decode(_)) => tracing::warn!("Ignoring malformed message: {e}"),
        Err(e) => tracing::error!("Live-reload error: {e}"),
    }
}

fn install_callbacks(session: &Rc<Session>) {
    let ws = session.ws.borrow();

    let on_open = {
        let session = Rc::clone(session);
        Closure::wrap(Box::new(move || {
            session.backoff.borrow_mut().reset();
            dispatch(&session, TransportEvent::Open);
        }) as Box<dyn FnMut()>)
    };
    ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let on_message = {
        let session = Rc::clone(session);
        Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Some(text) = event.data().as_string() {
                dispatch(&session, TransportEvent::Message(text));
            }
        }) as Box<dyn FnMut(MessageEvent)>)
    };
    ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    let on_close = {
        let session = Rc::clone(session);
        Closure::wrap(Box::new(move || {
            dispatch(&session, TransportEvent::Close);
            let delay = session.backoff.borrow_mut().next_delay();
            match delay {
                Some(delay) => {
                    let delay_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
                    schedule_reconnect(Rc::clone(&session), delay_ms);
                }
                None => tracing::warn!("Giving up reconnecting"),
            }
        }) as Box<dyn FnMut()>)
    };
    ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

    // `close` always follows `error`.
    let on_error = Closure::wrap(Box::new(move || {
        tracing::debug!("WebSocket error");
    }) as Box<dyn FnMut()>);
    ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    *session.callbacks.borrow_mut() = Callbacks {
        _on_open: Some(on_open),
        _on_message: Some(on_message),
        _on_close: Some(on_close),
        _on_error: Some(on_error),
    };
}

/// Open a fresh socket after `delay_ms`.
///
/// `Closure::once` + `forget`: each timer leaks its closure after firing.
fn schedule_reconnect(session: Rc<Session>, delay_ms: i32) {
    let closure: Closure<dyn FnMut()> = Closure::once(move || {
        tracing::debug!(url = %session.url, "Reconnecting");
        match WebSocket::new(&session.url) {
            Ok(ws) => {
                *session.ws.borrow_mut() = ws;
                install_callbacks(&session);
            }
            Err(e) => {
                tracing::error!("Reconnect failed: {e:?}");
                let delay = session.backoff.borrow_mut().next_delay();
                if let Some(delay) = delay {
                    let delay_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
                    schedule_reconnect(session, delay_ms);
                }
            }
        }
    });

    if let Some(window) = web_sys::window() {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms,
        );
    }
    closure.forget();
}
