//! In-memory transport for tests.
//!
//! `MockTransport` records every call made on it and lets the test drive the
//! readiness lifecycle by hand (`receive`, `respond_json`, `err`,
//! `advance_to`). XML documents are represented by their source text.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use serde_json::Value;

use crate::error::DecodeError;
use crate::http::{HttpMethod, RequestData};
use crate::transport::{ReadyState, ReadyStateListener, Transport};

/// A call made on a `MockTransport`, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open {
        method: HttpMethod,
        url: String,
        asynchronous: bool,
    },
    SetRequestHeader {
        name: String,
        value: String,
    },
    SetWithCredentials(bool),
    Send(Option<RequestData>),
    Abort,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    with_credentials: bool,
    ready_state: ReadyState,
    status: u16,
    status_text: String,
    response_text: String,
    response_headers: Vec<(String, String)>,
}

/// Recording transport driven by the test.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    state: Rc<RefCell<State>>,
    listeners: Rc<RefCell<Vec<ReadyStateListener>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// The `(method, url, asynchronous)` of every `open` call.
    pub fn opened(&self) -> Vec<(HttpMethod, String, bool)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Open {
                    method,
                    url,
                    asynchronous,
                } => Some((method.clone(), url.clone(), *asynchronous)),
                _ => None,
            })
            .collect()
    }

    /// Every `set_request_header` call, duplicates included.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::SetRequestHeader { name, value } => Some((name.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn sent_body(&self) -> Option<Option<RequestData>> {
        self.state.borrow().calls.iter().find_map(|call| match call {
            Call::Send(body) => Some(body.clone()),
            _ => None,
        })
    }

    pub fn with_credentials(&self) -> bool {
        self.state.borrow().with_credentials
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn set_response_header(&self, name: &str, value: &str) {
        self.state
            .borrow_mut()
            .response_headers
            .push((name.to_string(), value.to_string()));
    }

    pub fn set_response_body(&self, body: &str) {
        self.state.borrow_mut().response_text = body.to_string();
    }

    /// Move to `ready_state` with `status` and notify listeners.
    pub fn advance_to(&self, ready_state: ReadyState, status: u16) -> Result<(), DecodeError> {
        {
            let mut state = self.state.borrow_mut();
            state.ready_state = ready_state;
            state.status = status;
            state.status_text = reason_phrase(status).to_string();
        }
        self.notify(ready_state)
    }

    /// Complete with `status` and `body`, passing through every intermediate state.
    pub fn receive(&self, status: u16, body: &str) -> Result<(), DecodeError> {
        self.advance_to(ReadyState::HeadersReceived, status)?;
        self.set_response_body(body);
        self.advance_to(ReadyState::Loading, status)?;
        self.advance_to(ReadyState::Done, status)
    }

    /// Complete with a JSON body and an `application/json` content type.
    pub fn respond_json(&self, status: u16, body: &Value) -> Result<(), DecodeError> {
        self.set_response_header("Content-Type", "application/json");
        self.receive(status, &body.to_string())
    }

    /// Fail at the network level: status 0, no body.
    pub fn err(&self) -> Result<(), DecodeError> {
        self.advance_to(ReadyState::Done, 0)
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    /// Deliver `ready_state` to every listener with no borrow held.
    fn notify(&self, ready_state: ReadyState) -> Result<(), DecodeError> {
        let mut listeners = mem::take(&mut *self.listeners.borrow_mut());
        let mut outcome = Ok(());
        for listener in &mut listeners {
            outcome = listener.notify(ready_state);
            if outcome.is_err() {
                break;
            }
        }
        let mut slot = self.listeners.borrow_mut();
        listeners.append(&mut slot);
        *slot = listeners;
        outcome
    }
}

impl Transport for MockTransport {
    type Document = String;

    fn open(&self, method: &HttpMethod, url: &str, asynchronous: bool) {
        self.record(Call::Open {
            method: method.clone(),
            url: url.to_string(),
            asynchronous,
        });
        self.state.borrow_mut().ready_state = ReadyState::Opened;
        if let Err(err) = self.notify(ReadyState::Opened) {
            tracing::warn!(error = %err, "listener failed on open");
        }
    }

    fn set_request_header(&self, name: &str, value: &str) {
        self.record(Call::SetRequestHeader {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn set_with_credentials(&self, enabled: bool) {
        self.record(Call::SetWithCredentials(enabled));
        self.state.borrow_mut().with_credentials = enabled;
    }

    fn subscribe(&self, listener: ReadyStateListener) {
        self.listeners.borrow_mut().push(listener);
    }

    fn send(&self, body: Option<&RequestData>) {
        self.record(Call::Send(body.cloned()));
    }

    fn abort(&self) {
        self.record(Call::Abort);
        let in_flight = {
            let state = self.state.borrow();
            !matches!(state.ready_state, ReadyState::Unsent | ReadyState::Done)
        };
        if in_flight {
            if let Err(err) = self.advance_to(ReadyState::Done, 0) {
                tracing::warn!(error = %err, "listener failed on abort");
            }
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready_state
    }

    fn status(&self) -> u16 {
        self.state.borrow().status
    }

    fn status_text(&self) -> String {
        self.state.borrow().status_text.clone()
    }

    fn response_text(&self) -> String {
        self.state.borrow().response_text.clone()
    }

    fn response_xml(&self) -> Option<String> {
        let is_xml = self
            .get_response_header("content-type")
            .is_some_and(|ct| ct.contains("xml"));
        is_xml.then(|| self.response_text())
    }

    fn get_response_header(&self, name: &str) -> Option<String> {
        self.state
            .borrow()
            .response_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn get_all_response_headers(&self) -> String {
        self.state
            .borrow()
            .response_headers
            .iter()
            .map(|(k, v)| format!("{k}: {v}\r\n"))
            .collect()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn receive_walks_through_states() {
        let xhr = MockTransport::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let (listener, _sub) = ReadyStateListener::new(move |state| {
            log.borrow_mut().push(state);
            Ok(())
        });
        xhr.subscribe(listener);

        xhr.receive(200, "ok").unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![ReadyState::HeadersReceived, ReadyState::Loading, ReadyState::Done]
        );
        assert_eq!(xhr.status_text(), "OK");
    }

    #[test]
    fn listener_may_read_transport_during_notify() {
        let xhr = Rc::new(MockTransport::new());
        let status = Rc::new(Cell::new(0));
        let (inner, seen) = (Rc::downgrade(&xhr), Rc::clone(&status));
        let (listener, _sub) = ReadyStateListener::new(move |_| {
            if let Some(xhr) = inner.upgrade() {
                seen.set(xhr.status());
            }
            Ok(())
        });
        xhr.subscribe(listener);

        xhr.err().unwrap();
        assert_eq!(status.get(), 0);
        xhr.advance_to(ReadyState::Done, 204).unwrap();
        assert_eq!(status.get(), 204);
    }

    #[test]
    fn abort_completes_an_in_flight_request() {
        let xhr = MockTransport::new();
        xhr.open(&HttpMethod::Get, "test", true);
        xhr.abort();
        assert_eq!(xhr.ready_state(), ReadyState::Done);
        assert_eq!(xhr.calls().last(), Some(&Call::Abort));
    }

    #[test]
    fn clones_share_one_request() {
        let xhr = MockTransport::new();
        let host_side = xhr.clone();
        xhr.open(&HttpMethod::Post, "test", true);
        host_side.receive(201, "made").unwrap();
        assert_eq!(xhr.opened().len(), 1);
        assert_eq!(xhr.status(), 201);
        assert_eq!(xhr.response_text(), "made");
    }

    #[test]
    fn response_xml_only_for_xml_content() {
        let xhr = MockTransport::new();
        xhr.set_response_body("<a/>");
        assert_eq!(xhr.response_xml(), None);
        xhr.set_response_header("Content-Type", "text/xml");
        assert_eq!(xhr.response_xml().as_deref(), Some("<a/>"));
    }
}
