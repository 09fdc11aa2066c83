//! Callback, handle and promise request dispatch over an XHR-like transport.
//!
//! # Overview
//! `Ajax::request` turns one `RequestConfig` into a configured request on a
//! caller-supplied `Transport`: method defaulting, GET query serialization,
//! `Accept` negotiation and header application, then `send`. It returns at
//! once. The transport's readiness notifications drive everything after
//! that: body decoding by media type, the `success`/`error` callbacks, and
//! settlement of the returned `Promise` when a promise constructor is
//! available.
//!
//! # Design
//! - The core never performs I/O; the transport does (host-does-IO pattern).
//! - Single-threaded: handles are `Rc`-shared between the caller, the
//!   readiness listener and the promise.
//! - A promise resolves with the decoded body and rejects with the transport
//!   handle, so failed requests stay inspectable.
//! - `mock::MockTransport` is a recording transport for tests, behind the
//!   `mock` feature.

pub mod accept;
pub mod client;
pub mod completion;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod promise;
pub mod query;
pub mod transport;

pub use accept::DataType;
pub use client::{Ajax, ReturnedHandle};
pub use config::{Environment, RequestConfig, RequestOptions};
pub use decode::ResponseData;
pub use error::{AjaxError, DecodeError, OptionsError, StatusError};
pub use http::{Headers, HttpMethod, RequestData};
pub use promise::{MirroredXhr, Promise, PromiseConstructor, StatusLine};
pub use transport::{
    ReadyState, ReadyStateListener, Subscription, Transition, Transport, TransportFactory,
    XhrHandle,
};
