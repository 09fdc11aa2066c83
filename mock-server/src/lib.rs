use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` reports back about the request it received.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub const XML_BODY: &str = r#"<?xml version="1.0"?><item id="1">widget</item>"#;

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/json", get(json_item))
        .route("/xml", get(xml_item))
        .route("/text", get(text_item))
        .route("/empty-json", get(empty_json))
        .route("/broken-json", get(broken_json))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    method: Method,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    tracing::debug!(%method, "echo");
    Json(Echo {
        method: method.to_string(),
        query,
        headers,
        body,
    })
}

async fn status(Path(code): Path<u16>) -> Result<impl IntoResponse, StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let body = serde_json::json!({ "status": code }).to_string();
    Ok((status, [(header::CONTENT_TYPE, "application/json")], body))
}

async fn json_item() -> impl IntoResponse {
    Json(serde_json::json!({ "id": 1, "name": "widget" }))
}

async fn xml_item() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], XML_BODY)
}

async fn text_item() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], "plain widget")
}

async fn empty_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "")
}

async fn broken_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "{\"id\": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "GET".to_string(),
            query: BTreeMap::from([("a".to_string(), "1".to_string())]),
            headers: BTreeMap::new(),
            body: String::new(),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["query"]["a"], "1");
        assert_eq!(json["body"], "");
    }

    #[test]
    fn xml_fixture_is_a_document() {
        assert!(XML_BODY.starts_with("<?xml"));
    }
}
