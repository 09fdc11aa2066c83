//! The request dispatcher.
//!
//! # Design
//! `Ajax` holds a transport factory, the environment and an optional promise
//! constructor slot, and carries no per-request state: each call to
//! `request` creates its own transport and shares nothing with other calls.
//! `request` returns as soon as the transport has been told to send;
//! everything after that is driven by the transport's readiness
//! notifications.

use tracing::debug;

use crate::accept;
use crate::completion::CompletionHandler;
use crate::config::{Environment, RequestConfig};
use crate::error::AjaxError;
use crate::http::{HttpMethod, RequestData};
use crate::promise::{self, Promise, PromiseConstructor};
use crate::query;
use crate::transport::{ReadyState, ReadyStateListener, Transport, TransportFactory, XhrHandle};

/// What `request` hands back: a promise when a constructor is available,
/// otherwise the transport handle itself.
#[derive(Debug)]
pub enum ReturnedHandle<T: Transport> {
    Promise(Promise<T>),
    Transport(XhrHandle<T>),
}

impl<T: Transport> ReturnedHandle<T> {
    pub fn promise(&self) -> Option<&Promise<T>> {
        match self {
            ReturnedHandle::Promise(promise) => Some(promise),
            ReturnedHandle::Transport(_) => None,
        }
    }

    pub fn into_promise(self) -> Option<Promise<T>> {
        match self {
            ReturnedHandle::Promise(promise) => Some(promise),
            ReturnedHandle::Transport(_) => None,
        }
    }

    pub fn transport(&self) -> Option<&XhrHandle<T>> {
        match self {
            ReturnedHandle::Transport(xhr) => Some(xhr),
            ReturnedHandle::Promise(_) => None,
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        match self {
            ReturnedHandle::Promise(promise) => promise.id(),
            ReturnedHandle::Transport(xhr) => xhr.id(),
        }
    }

    /// Status as seen through this handle: mirrored for a promise, live otherwise.
    pub fn status(&self) -> u16 {
        match self {
            ReturnedHandle::Promise(promise) => promise.status(),
            ReturnedHandle::Transport(xhr) => xhr.status(),
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        match self {
            ReturnedHandle::Promise(promise) => promise.ready_state(),
            ReturnedHandle::Transport(xhr) => xhr.ready_state(),
        }
    }

    pub fn abort(&self) {
        match self {
            ReturnedHandle::Promise(promise) => promise.abort(),
            ReturnedHandle::Transport(xhr) => xhr.abort(),
        }
    }
}

/// Dispatches requests over transports made by `F`.
#[derive(Debug, Clone)]
pub struct Ajax<F> {
    factory: F,
    environment: Environment,
    promise: Option<PromiseConstructor>,
}

impl<F: TransportFactory> Ajax<F> {
    pub fn new(factory: F) -> Self {
        Self::with_environment(factory, Environment::default())
    }

    pub fn with_environment(factory: F, environment: Environment) -> Self {
        Self {
            factory,
            environment,
            promise: None,
        }
    }

    /// Fill the dispatcher's promise slot, preferred over the environment's.
    pub fn with_promise(mut self, constructor: PromiseConstructor) -> Self {
        self.promise = Some(constructor);
        self
    }

    pub fn set_promise(&mut self, constructor: Option<PromiseConstructor>) {
        self.promise = constructor;
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Build, configure and send one request.
    ///
    /// Fails only when `config` has no url, and then before a transport is
    /// created. On return `config.original_xhr` holds the live handle.
    pub fn request(
        &self,
        config: &mut RequestConfig<F::Transport>,
    ) -> Result<ReturnedHandle<F::Transport>, AjaxError> {
        let base_url = config.url.as_deref().ok_or(AjaxError::MissingUrl)?;
        let method = config.method.clone().unwrap_or_default();

        let mut headers = config.headers.clone();
        if let Some(content_type) = &config.content_type {
            headers
                .get_or_insert_with(Default::default)
                .set("Content-Type", content_type.as_str());
        }

        let url = match (&method, &config.data) {
            (HttpMethod::Get, Some(RequestData::Params(params))) => {
                let fragment =
                    query::serialize(params.iter().map(|(k, v)| (k.as_str(), v.as_deref())));
                query::append(base_url, &fragment)
            }
            _ => base_url.to_string(),
        };

        let xhr = XhrHandle::new(self.factory.create());
        debug!(request_id = %xhr.id(), %method, %url, "dispatching request");

        if config.credentials {
            xhr.transport().set_with_credentials(true);
        }

        let constructor = promise::resolve_constructor(
            config.promise.as_ref(),
            self.promise.as_ref(),
            self.environment.promise.as_ref(),
        );
        let (deferred, promise) = match &constructor {
            Some(constructor) => {
                let (deferred, promise) = constructor.deferred(&xhr);
                (Some(deferred), Some(promise))
            }
            None => (None, None),
        };

        let explicit_accept = config.explicit_accept().map(str::to_string);

        let mut handler = CompletionHandler {
            xhr: Some(xhr.clone()),
            accepts: explicit_accept.clone(),
            file_protocol: self.environment.is_file_protocol(),
            success: config.success.clone(),
            error: config.error.clone(),
            deferred,
        };
        let (listener, subscription) =
            ReadyStateListener::new(move |state| handler.on_ready_state_change(state));
        xhr.transport().subscribe(listener);
        xhr.attach(subscription);

        xhr.transport().open(&method, &url, true);

        if explicit_accept.is_none() {
            let accept = accept::resolve(config.data_type.as_ref());
            xhr.set_request_header("Accept", &accept);
        }
        if let Some(headers) = &headers {
            for (name, value) in headers.iter() {
                xhr.set_request_header(name, value);
            }
        }

        if let Some(before_send) = &config.before_send {
            before_send(&xhr);
        }
        xhr.transport().send(config.data.as_ref());

        config.original_xhr = Some(xhr.clone());

        Ok(match promise {
            Some(promise) => ReturnedHandle::Promise(promise),
            None => ReturnedHandle::Transport(xhr),
        })
    }
}
