//! Response body decoding driven by a media-type signal.
//!
//! The signal is the caller's explicit `Accept` header when one was given,
//! otherwise the response's own `Content-Type`. Matching is a prefix test on
//! the signal, so `application/json; charset=utf-8` still selects JSON while a
//! list such as `application/vnd+x, application/json` does not.

use serde_json::Value;

use crate::error::DecodeError;
use crate::transport::Transport;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData<D> {
    /// The transport's parsed XML document, if it produced one.
    Document(Option<D>),
    Json(Value),
    Text(String),
}

impl<D> ResponseData<D> {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&D> {
        match self {
            ResponseData::Document(doc) => doc.as_ref(),
            _ => None,
        }
    }
}

/// Decoding strategy chosen from a media-type signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Xml,
    Json,
    Text,
}

impl Strategy {
    pub fn for_signal(signal: Option<&str>) -> Self {
        let Some(signal) = signal else {
            return Strategy::Text;
        };
        if signal.starts_with("application/xml") || signal.starts_with("text/xml") {
            Strategy::Xml
        } else if signal.starts_with("application/json") {
            Strategy::Json
        } else {
            Strategy::Text
        }
    }
}

/// Decode the body held by `transport`.
///
/// `accepts` overrides the response `Content-Type` as the signal. An empty
/// body under a JSON signal is returned as empty text rather than parsed.
pub fn decode<T: Transport>(
    accepts: Option<&str>,
    transport: &T,
) -> Result<ResponseData<T::Document>, DecodeError> {
    let discovered;
    let signal = match accepts {
        Some(signal) => Some(signal),
        None => {
            discovered = transport.get_response_header("content-type");
            discovered.as_deref()
        }
    };

    match Strategy::for_signal(signal) {
        Strategy::Xml => Ok(ResponseData::Document(transport.response_xml())),
        Strategy::Json => {
            let text = transport.response_text();
            if text.is_empty() {
                return Ok(ResponseData::Text(text));
            }
            Ok(ResponseData::Json(serde_json::from_str(&text)?))
        }
        Strategy::Text => Ok(ResponseData::Text(transport.response_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use serde_json::json;

    fn responded(content_type: Option<&str>, body: &str) -> MockTransport {
        let xhr = MockTransport::new();
        if let Some(ct) = content_type {
            xhr.set_response_header("Content-Type", ct);
        }
        xhr.set_response_body(body);
        xhr
    }

    #[test]
    fn signal_selects_strategy() {
        assert_eq!(Strategy::for_signal(Some("application/xml")), Strategy::Xml);
        assert_eq!(Strategy::for_signal(Some("text/xml; charset=utf-8")), Strategy::Xml);
        assert_eq!(Strategy::for_signal(Some("application/json")), Strategy::Json);
        assert_eq!(Strategy::for_signal(Some("text/javascript")), Strategy::Text);
        assert_eq!(Strategy::for_signal(None), Strategy::Text);
    }

    #[test]
    fn content_type_is_used_without_accept() {
        let xhr = responded(Some("application/json"), r#"{"id": 1}"#);
        let data = decode(None, &xhr).unwrap();
        assert_eq!(data, ResponseData::Json(json!({"id": 1})));
    }

    #[test]
    fn explicit_accept_overrides_content_type() {
        let xhr = responded(Some("text/plain"), r#"{"id": 1}"#);
        let data = decode(Some("application/json"), &xhr).unwrap();
        assert_eq!(data.as_json(), Some(&json!({"id": 1})));
    }

    #[test]
    fn unknown_media_type_returns_raw_text() {
        let xhr = responded(Some("application/vnd+myformat"), r#"{"id": 1}"#);
        let data = decode(None, &xhr).unwrap();
        assert_eq!(data.as_text(), Some(r#"{"id": 1}"#));
    }

    #[test]
    fn empty_json_body_is_not_parsed() {
        let xhr = responded(Some("application/json"), "");
        assert_eq!(decode(None, &xhr).unwrap(), ResponseData::Text(String::new()));
    }

    #[test]
    fn xml_returns_the_transport_document() {
        let xhr = responded(Some("application/xml"), "<a>1</a>");
        let data = decode(None, &xhr).unwrap();
        assert_eq!(data.as_document().map(String::as_str), Some("<a>1</a>"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let xhr = responded(Some("application/json"), "{not json");
        assert!(matches!(decode(None, &xhr), Err(DecodeError::Json(_))));
    }
}
