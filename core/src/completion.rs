//! The readiness listener bound to each dispatched transport.
//!
//! Every notification first refreshes the promise's mirrored view. Only the
//! terminal one decodes the body and dispatches: `success` and promise
//! resolution for valid statuses, `error` and promise rejection (with the
//! handle) otherwise. A decode failure returns early, leaving callbacks
//! uncalled and the promise pending, and travels back to the transport.
//!
//! The handler keeps the request's handle alive until the terminal
//! notification, so callback-only callers may drop everything `request`
//! gave them. Releasing it there breaks the transport → listener → handle
//! cycle.

use crate::config::{ErrorCallback, SuccessCallback};
use crate::decode;
use crate::error::{DecodeError, StatusError};
use crate::promise::Deferred;
use crate::transport::{ReadyState, Transition, Transport, XhrHandle};

/// Whether `status` counts as success. Status 0 only does for `file:` pages.
pub fn is_valid(status: u16, file_protocol: bool) -> bool {
    (200..300).contains(&status) || status == 304 || (status == 0 && file_protocol)
}

pub(crate) struct CompletionHandler<T: Transport> {
    pub(crate) xhr: Option<XhrHandle<T>>,
    pub(crate) accepts: Option<String>,
    pub(crate) file_protocol: bool,
    pub(crate) success: Option<SuccessCallback<T>>,
    pub(crate) error: Option<ErrorCallback<T>>,
    pub(crate) deferred: Option<Deferred<T>>,
}

impl<T: Transport> CompletionHandler<T> {
    pub(crate) fn on_ready_state_change(&mut self, state: ReadyState) -> Result<(), DecodeError> {
        let Some(xhr) = &self.xhr else {
            return Ok(());
        };
        tracing::trace!(request_id = %xhr.id(), ?state, "ready state changed");

        if let Some(deferred) = &self.deferred {
            deferred.mirror(xhr.transport());
        }
        if state.transition() != Transition::Complete {
            return Ok(());
        }
        let xhr = xhr.clone();
        self.xhr = None;

        let status = xhr.status();
        let data = match decode::decode(self.accepts.as_deref(), xhr.transport()) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(request_id = %xhr.id(), status, error = %err, "response body could not be decoded");
                return Err(err);
            }
        };

        if is_valid(status, self.file_protocol) {
            tracing::debug!(request_id = %xhr.id(), status, "request succeeded");
            if let Some(success) = &self.success {
                success(&data);
            }
            if let Some(deferred) = &mut self.deferred {
                deferred.resolve(data);
            }
        } else {
            tracing::debug!(request_id = %xhr.id(), status, "request failed");
            let error = StatusError { status };
            if let Some(callback) = &self.error {
                callback(&xhr, status, &error);
            }
            if let Some(deferred) = &mut self.deferred {
                deferred.reject(xhr);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_and_not_modified_are_valid() {
        assert!(is_valid(200, false));
        assert!(is_valid(299, false));
        assert!(is_valid(304, false));
        assert!(!is_valid(300, false));
        assert!(!is_valid(199, false));
        assert!(!is_valid(404, false));
        assert!(!is_valid(500, false));
    }

    #[test]
    fn status_zero_depends_on_file_protocol() {
        assert!(!is_valid(0, false));
        assert!(is_valid(0, true));
    }
}
