//! Per-request configuration and the execution environment.
//!
//! # Design
//! `RequestConfig` is the caller-owned record a request is built from. The
//! dispatcher only reads it, with one exception: after sending it stores the
//! live handle in `original_xhr` so the caller can reach the transport even
//! when a promise was returned instead.
//!
//! Callbacks are `Rc` so they can be shared with the completion handler
//! without taking them out of the record.
//!
//! `RequestOptions` is the serializable, data-only subset, for requests that
//! come from JSON (fixtures, config files). `type` is accepted as an alias of
//! `method`.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::accept::DataType;
use crate::decode::ResponseData;
use crate::error::{OptionsError, StatusError};
use crate::http::{Headers, HttpMethod, RequestData};
use crate::promise::PromiseConstructor;
use crate::transport::{Transport, XhrHandle};

pub type SuccessCallback<T> = Rc<dyn Fn(&ResponseData<<T as Transport>::Document>)>;
pub type ErrorCallback<T> = Rc<dyn Fn(&XhrHandle<T>, u16, &StatusError)>;
pub type BeforeSend<T> = Rc<dyn Fn(&XhrHandle<T>)>;

/// Data-only request options, deserializable from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub url: Option<String>,
    #[serde(alias = "type")]
    pub method: Option<HttpMethod>,
    pub data: Option<RequestData>,
    pub data_type: Option<DataType>,
    pub content_type: Option<String>,
    pub headers: Option<Headers>,
    #[serde(default)]
    pub credentials: bool,
}

impl RequestOptions {
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Everything one request is built from.
pub struct RequestConfig<T: Transport> {
    pub url: Option<String>,
    pub method: Option<HttpMethod>,
    pub data: Option<RequestData>,
    pub data_type: Option<DataType>,
    pub content_type: Option<String>,
    pub headers: Option<Headers>,
    pub credentials: bool,
    pub before_send: Option<BeforeSend<T>>,
    pub success: Option<SuccessCallback<T>>,
    pub error: Option<ErrorCallback<T>>,
    /// Promise constructor for this request only; wins over every other source.
    pub promise: Option<PromiseConstructor>,
    /// Live transport handle, written by the dispatcher.
    pub original_xhr: Option<XhrHandle<T>>,
}

impl<T: Transport> Default for RequestConfig<T> {
    fn default() -> Self {
        Self {
            url: None,
            method: None,
            data: None,
            data_type: None,
            content_type: None,
            headers: None,
            credentials: false,
            before_send: None,
            success: None,
            error: None,
            promise: None,
            original_xhr: None,
        }
    }
}

impl<T: Transport> RequestConfig<T> {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn from_options(options: RequestOptions) -> Self {
        Self {
            url: options.url,
            method: options.method,
            data: options.data,
            data_type: options.data_type,
            content_type: options.content_type,
            headers: options.headers,
            credentials: options.credentials,
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl Into<HttpMethod>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn data_type(mut self, data_type: impl Into<DataType>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(Headers::new).set(name, value);
        self
    }

    pub fn credentials(mut self, enabled: bool) -> Self {
        self.credentials = enabled;
        self
    }

    pub fn before_send(mut self, hook: impl Fn(&XhrHandle<T>) + 'static) -> Self {
        self.before_send = Some(Rc::new(hook));
        self
    }

    pub fn success(mut self, callback: impl Fn(&ResponseData<T::Document>) + 'static) -> Self {
        self.success = Some(Rc::new(callback));
        self
    }

    pub fn error(mut self, callback: impl Fn(&XhrHandle<T>, u16, &StatusError) + 'static) -> Self {
        self.error = Some(Rc::new(callback));
        self
    }

    pub fn promise(mut self, constructor: PromiseConstructor) -> Self {
        self.promise = Some(constructor);
        self
    }

    /// The caller's explicit `Accept` header, if any.
    pub fn explicit_accept(&self) -> Option<&str> {
        self.headers.as_ref().and_then(|h| h.get("Accept"))
    }
}

impl<T: Transport> fmt::Debug for RequestConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("data", &self.data)
            .field("data_type", &self.data_type)
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .field("credentials", &self.credentials)
            .field("promise", &self.promise)
            .field("original_xhr", &self.original_xhr)
            .finish_non_exhaustive()
    }
}

/// The execution context requests run in.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Scheme of the page location, e.g. `"https:"` or `"file:"`.
    pub location_protocol: Option<String>,
    /// Promise constructor available to every request by default.
    pub promise: Option<PromiseConstructor>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.location_protocol = Some(protocol.into());
        self
    }

    pub fn promise(mut self, constructor: PromiseConstructor) -> Self {
        self.promise = Some(constructor);
        self
    }

    pub fn is_file_protocol(&self) -> bool {
        self.location_protocol.as_deref() == Some("file:")
    }
}
