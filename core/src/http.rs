//! Plain-data request pieces handed to a transport.
//!
//! # Design
//! The core never performs I/O itself. These types describe what the caller
//! asked for (verb, body, headers) as owned values so the transport can act on
//! them however it likes. Headers are an ordered list rather than a map
//! because they are applied to the transport in iteration order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// HTTP verb for a request. Unknown verbs are carried verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Other(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(verb) => verb,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Other(other.to_string()),
        })
    }
}

impl From<&str> for HttpMethod {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let verb = String::deserialize(deserializer)?;
        Ok(HttpMethod::from(verb.as_str()))
    }
}

/// Request data: either a key/value mapping or a raw body.
///
/// A mapping value of `None` is the null/undefined case and is skipped when
/// the mapping is turned into a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestData {
    Params(Vec<(String, Option<String>)>),
    Raw(String),
}

impl RequestData {
    /// Build a mapping from `(key, value)` pairs, keeping their order.
    pub fn params<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RequestData::Params(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }

    pub fn raw(body: impl Into<String>) -> Self {
        RequestData::Raw(body.into())
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, RequestData::Params(_))
    }
}

impl From<Value> for RequestData {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RequestData::Params(
                map.into_iter()
                    .map(|(key, value)| {
                        let value = match value {
                            Value::Null => None,
                            Value::String(s) => Some(s),
                            Value::Number(n) => Some(number_text(&n)),
                            other => Some(other.to_string()),
                        };
                        (key, value)
                    })
                    .collect(),
            ),
            Value::String(s) => RequestData::Raw(s),
            other => RequestData::Raw(other.to_string()),
        }
    }
}

/// Render a number the way script string conversion does: whole floats drop
/// their fraction, so `1.0` becomes `"1"`.
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(f) if number.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            format!("{:.0}", f + 0.0)
        }
        _ => number.to_string(),
    }
}

impl<'de> Deserialize<'de> for RequestData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(RequestData::from(Value::deserialize(deserializer)?))
    }
}

/// Ordered request headers with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace the first header matching `name` in place, or append it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.set(k, v);
        }
        headers
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::deserialize(deserializer)?;
        Ok(map
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect())
    }
}
