//! The XHR-like transport seam and the live handle wrapped around it.
//!
//! # Design
//! A `Transport` is supplied by the caller and does all actual I/O. Every
//! method takes `&self`: like a browser request object, the handle is shared
//! between the caller, the readiness listener and any promise, so
//! implementations keep their state behind interior mutability.
//!
//! Implementors must not hold an internal borrow while invoking a listener,
//! because listeners read the handle (status, body, headers) and user
//! callbacks may call back into it. Whatever a listener returns is handed back
//! to the code that drove the transition.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use uuid::Uuid;

use crate::error::DecodeError;
use crate::http::{HttpMethod, RequestData};

/// Lifecycle states of a transport. `Done` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    #[default]
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    Done = 4,
}

/// The two transitions the completion logic distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    InProgress,
    Complete,
}

impl ReadyState {
    pub fn transition(self) -> Transition {
        match self {
            ReadyState::Done => Transition::Complete,
            _ => Transition::InProgress,
        }
    }
}

/// An XHR-like request object.
pub trait Transport: 'static {
    /// Parsed XML representation produced by `response_xml`.
    type Document: Clone + fmt::Debug + 'static;

    fn open(&self, method: &HttpMethod, url: &str, asynchronous: bool);
    fn set_request_header(&self, name: &str, value: &str);
    fn set_with_credentials(&self, enabled: bool);
    fn subscribe(&self, listener: ReadyStateListener);
    fn send(&self, body: Option<&RequestData>);
    fn abort(&self);

    fn ready_state(&self) -> ReadyState;
    fn status(&self) -> u16;
    fn status_text(&self) -> String;
    fn response_text(&self) -> String;
    fn response_xml(&self) -> Option<Self::Document>;
    fn get_response_header(&self, name: &str) -> Option<String>;
    fn get_all_response_headers(&self) -> String;
}

/// Creates one fresh transport per dispatched request.
pub trait TransportFactory {
    type Transport: Transport;

    fn create(&self) -> Self::Transport;
}

impl<T: Transport, F: Fn() -> T> TransportFactory for F {
    type Transport = T;

    fn create(&self) -> T {
        self()
    }
}

type ListenerFn = dyn FnMut(ReadyState) -> Result<(), DecodeError>;

struct ListenerSlot {
    active: Cell<bool>,
    callback: RefCell<Option<Box<ListenerFn>>>,
}

/// Callback a transport invokes on every ready-state change.
///
/// The transport owns the listener. Dropping it, or cancelling its
/// `Subscription`, drops the callback and everything the callback captured.
pub struct ReadyStateListener {
    slot: Rc<ListenerSlot>,
}

/// Cancels the paired `ReadyStateListener`.
#[derive(Debug, Clone)]
pub struct Subscription {
    slot: Weak<ListenerSlot>,
}

impl ReadyStateListener {
    pub fn new<F>(callback: F) -> (Self, Subscription)
    where
        F: FnMut(ReadyState) -> Result<(), DecodeError> + 'static,
    {
        let slot = Rc::new(ListenerSlot {
            active: Cell::new(true),
            callback: RefCell::new(Some(Box::new(callback))),
        });
        let subscription = Subscription {
            slot: Rc::downgrade(&slot),
        };
        (Self { slot }, subscription)
    }

    /// Deliver `state`. A cancelled listener ignores it.
    ///
    /// The callback runs outside the slot's borrow, so it may cancel its own
    /// subscription; it is then dropped once it returns.
    pub fn notify(&mut self, state: ReadyState) -> Result<(), DecodeError> {
        if !self.slot.active.get() {
            return Ok(());
        }
        let Some(mut callback) = self.slot.callback.borrow_mut().take() else {
            return Ok(());
        };
        let result = callback(state);
        if self.slot.active.get() {
            *self.slot.callback.borrow_mut() = Some(callback);
        }
        result
    }

    pub fn is_active(&self) -> bool {
        self.slot.active.get()
    }
}

impl fmt::Debug for ReadyStateListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyStateListener")
            .field("active", &self.slot.active.get())
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Deactivate the listener and release its callback.
    pub fn cancel(&self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        slot.active.set(false);
        let callback = slot.callback.borrow_mut().take();
        drop(callback);
    }

    /// False once cancelled or once the transport has dropped the listener.
    pub fn is_active(&self) -> bool {
        self.slot.upgrade().is_some_and(|slot| slot.active.get())
    }
}

/// Shared handle to the live transport of one request.
pub struct XhrHandle<T> {
    id: Uuid,
    transport: Rc<T>,
    subscription: Rc<RefCell<Option<Subscription>>>,
}

impl<T> Clone for XhrHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            transport: Rc::clone(&self.transport),
            subscription: Rc::clone(&self.subscription),
        }
    }
}

impl<T: Transport> XhrHandle<T> {
    pub(crate) fn new(transport: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport: Rc::new(transport),
            subscription: Rc::new(RefCell::new(None)),
        }
    }

    pub(crate) fn attach(&self, subscription: Subscription) {
        *self.subscription.borrow_mut() = Some(subscription);
    }

    /// Identifier assigned when the request was dispatched.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Stop reacting to readiness changes. Callbacks no longer fire and a
    /// pending promise rejects with this handle; the exchange itself is left
    /// to the transport.
    pub fn detach(&self) {
        let subscription = self.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }

    /// Whether both handles refer to the same transport.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.transport, &other.transport)
    }

    pub fn ready_state(&self) -> ReadyState {
        self.transport.ready_state()
    }

    pub fn status(&self) -> u16 {
        self.transport.status()
    }

    pub fn status_text(&self) -> String {
        self.transport.status_text()
    }

    pub fn response_text(&self) -> String {
        self.transport.response_text()
    }

    pub fn response_xml(&self) -> Option<T::Document> {
        self.transport.response_xml()
    }

    pub fn set_request_header(&self, name: &str, value: &str) {
        self.transport.set_request_header(name, value);
    }

    pub fn get_response_header(&self, name: &str) -> Option<String> {
        self.transport.get_response_header(name)
    }

    pub fn get_all_response_headers(&self) -> String {
        self.transport.get_all_response_headers()
    }

    pub fn abort(&self) {
        self.transport.abort();
    }
}

impl<T> PartialEq for XhrHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.transport, &other.transport)
    }
}

impl<T> fmt::Debug for XhrHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XhrHandle").field("id", &self.id).finish_non_exhaustive()
    }
}
