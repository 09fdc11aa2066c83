//! Promise wrapping of a request and the transport view mirrored onto it.
//!
//! # Design
//! A `Promise` is a future settled from the readiness listener through a
//! oneshot channel. It resolves with the decoded body and rejects with the
//! transport handle itself, not with an error value: callers inspect the
//! handle (status, headers, body) on failure.
//!
//! The promise also carries a `MirroredXhr`, a copy of the transport's
//! observable fields refreshed on every readiness notification before any
//! settlement for that notification. Between notifications the copy can lag
//! the transport; the bound methods (`abort`, `set_request_header`, header
//! getters) always act on the live transport.

use std::borrow::Cow;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use uuid::Uuid;

use crate::decode::ResponseData;
use crate::transport::{ReadyState, Transport, XhrHandle};

/// The capability to produce promises.
///
/// Which constructor produced a given promise is observable through
/// `Promise::constructor`, so callers can tell a request-level override from
/// the dispatcher's slot or the environment default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromiseConstructor {
    name: Cow<'static, str>,
}

impl PromiseConstructor {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    /// The constructor most environments provide.
    pub fn native() -> Self {
        Self::new("native")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn deferred<T: Transport>(&self, xhr: &XhrHandle<T>) -> (Deferred<T>, Promise<T>) {
        let (sender, receiver) = oneshot::channel();
        let mirror = Rc::new(RefCell::new(MirroredXhr::default()));
        let deferred = Deferred {
            sender: Some(sender),
            mirror: Rc::clone(&mirror),
        };
        let promise = Promise {
            receiver,
            mirror,
            xhr: xhr.clone(),
            constructor: self.clone(),
        };
        (deferred, promise)
    }
}

/// Pick the constructor: request override, then dispatcher slot, then ambient.
pub fn resolve_constructor(
    request: Option<&PromiseConstructor>,
    slot: Option<&PromiseConstructor>,
    ambient: Option<&PromiseConstructor>,
) -> Option<PromiseConstructor> {
    request.or(slot).or(ambient).cloned()
}

/// Transport fields copied onto a promise on each readiness notification.
#[derive(Debug, Clone, PartialEq)]
pub struct MirroredXhr<D> {
    pub ready_state: ReadyState,
    pub status: u16,
    pub status_text: String,
    pub response_text: String,
    pub response_xml: Option<D>,
}

impl<D> Default for MirroredXhr<D> {
    fn default() -> Self {
        Self {
            ready_state: ReadyState::Unsent,
            status: 0,
            status_text: String::new(),
            response_text: String::new(),
            response_xml: None,
        }
    }
}

impl<D> MirroredXhr<D> {
    pub fn sync_from<T: Transport<Document = D>>(&mut self, transport: &T) {
        self.ready_state = transport.ready_state();
        self.status = transport.status();
        self.status_text = transport.status_text();
        self.response_text = transport.response_text();
        self.response_xml = transport.response_xml();
    }
}

/// Status code with its reason phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub code: u16,
    pub text: String,
}

/// What a promise settles with: decoded body, or the handle on failure.
pub type Settlement<T> = Result<ResponseData<<T as Transport>::Document>, XhrHandle<T>>;

/// Settle side of a promise, retained by the completion handler.
pub(crate) struct Deferred<T: Transport> {
    sender: Option<oneshot::Sender<Settlement<T>>>,
    mirror: Rc<RefCell<MirroredXhr<T::Document>>>,
}

impl<T: Transport> Deferred<T> {
    pub(crate) fn mirror(&self, transport: &T) {
        self.mirror.borrow_mut().sync_from(transport);
    }

    pub(crate) fn resolve(&mut self, data: ResponseData<T::Document>) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(Ok(data));
        }
    }

    pub(crate) fn reject(&mut self, xhr: XhrHandle<T>) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(Err(xhr));
        }
    }
}

/// A request wrapped as a future, inspectable as a transport in the meantime.
///
/// If the transport drops its listener without ever completing, the promise
/// rejects with its handle.
#[must_use = "a promise does nothing unless polled or inspected"]
pub struct Promise<T: Transport> {
    receiver: oneshot::Receiver<Settlement<T>>,
    mirror: Rc<RefCell<MirroredXhr<T::Document>>>,
    xhr: XhrHandle<T>,
    constructor: PromiseConstructor,
}

impl<T: Transport> Promise<T> {
    pub fn constructor(&self) -> &PromiseConstructor {
        &self.constructor
    }

    pub fn id(&self) -> Uuid {
        self.xhr.id()
    }

    /// All mirrored fields as of the latest notification.
    pub fn mirrored(&self) -> Ref<'_, MirroredXhr<T::Document>> {
        self.mirror.borrow()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.mirror.borrow().ready_state
    }

    pub fn status(&self) -> u16 {
        self.mirror.borrow().status
    }

    pub fn status_text(&self) -> String {
        self.mirror.borrow().status_text.clone()
    }

    pub fn response_text(&self) -> String {
        self.mirror.borrow().response_text.clone()
    }

    pub fn response_xml(&self) -> Option<T::Document> {
        self.mirror.borrow().response_xml.clone()
    }

    pub fn status_code(&self) -> StatusLine {
        let mirror = self.mirror.borrow();
        StatusLine {
            code: mirror.status,
            text: mirror.status_text.clone(),
        }
    }

    pub fn set_request_header(&self, name: &str, value: &str) {
        self.xhr.set_request_header(name, value);
    }

    pub fn get_response_header(&self, name: &str) -> Option<String> {
        self.xhr.get_response_header(name)
    }

    pub fn get_all_response_headers(&self) -> String {
        self.xhr.get_all_response_headers()
    }

    pub fn abort(&self) {
        self.xhr.abort();
    }
}

impl<T: Transport> Future for Promise<T> {
    type Output = Settlement<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(settlement)) => Poll::Ready(settlement),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(this.xhr.clone())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T: Transport> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("id", &self.xhr.id())
            .field("constructor", &self.constructor.name())
            .field("mirrored", &*self.mirror.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use futures::executor::block_on;

    #[test]
    fn request_override_wins_over_slot_and_ambient() {
        let request = PromiseConstructor::new("request");
        let slot = PromiseConstructor::new("slot");
        let ambient = PromiseConstructor::native();

        let picked = resolve_constructor(Some(&request), Some(&slot), Some(&ambient));
        assert_eq!(picked, Some(request));

        let picked = resolve_constructor(None, Some(&slot), Some(&ambient));
        assert_eq!(picked, Some(slot));

        let picked = resolve_constructor(None, None, Some(&ambient));
        assert_eq!(picked, Some(ambient));

        assert_eq!(resolve_constructor(None, None, None), None);
    }

    #[test]
    fn mirror_copies_transport_fields() {
        let xhr = MockTransport::new();
        xhr.set_response_body("hello");
        xhr.advance_to(ReadyState::Loading, 200).unwrap();

        let mut mirror = MirroredXhr::default();
        mirror.sync_from(&xhr);
        assert_eq!(mirror.ready_state, ReadyState::Loading);
        assert_eq!(mirror.status, 200);
        assert_eq!(mirror.status_text, "OK");
        assert_eq!(mirror.response_text, "hello");
    }

    #[test]
    fn dropped_deferred_rejects_with_handle() {
        let xhr = XhrHandle::new(MockTransport::new());
        let (deferred, promise) = PromiseConstructor::native().deferred(&xhr);
        drop(deferred);
        let rejected = block_on(promise).unwrap_err();
        assert!(rejected.ptr_eq(&xhr));
    }

    #[test]
    fn resolve_only_settles_once() {
        let xhr = XhrHandle::new(MockTransport::new());
        let (mut deferred, promise) = PromiseConstructor::native().deferred(&xhr);
        deferred.resolve(ResponseData::Text("first".to_string()));
        deferred.reject(xhr.clone());
        let data = block_on(promise).unwrap();
        assert_eq!(data.as_text(), Some("first"));
    }
}
