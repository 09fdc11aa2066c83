//! Verify request building and body decoding against JSON vectors in `test-vectors/`.
//!
//! Each vector file lists named cases with inputs and the expected outcome.
//! Requests go through `Ajax` over a `MockTransport`, so what is checked is
//! what the transport actually received.

use native_ajax::decode::{self, ResponseData};
use native_ajax::mock::MockTransport;
use native_ajax::{Ajax, DecodeError, HttpMethod, RequestConfig, RequestData, XhrHandle};
use serde_json::Value;

fn ajax() -> Ajax<fn() -> MockTransport> {
    Ajax::new(MockTransport::new as fn() -> MockTransport)
}

fn dispatch(config: &mut RequestConfig<MockTransport>) -> XhrHandle<MockTransport> {
    ajax().request(config).unwrap();
    config.original_xhr.clone().unwrap()
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[test]
fn query_test_vectors() {
    let raw = include_str!("../../test-vectors/query.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut config = RequestConfig::<MockTransport>::new(case["url"].as_str().unwrap())
            .data(RequestData::from(case["data"].clone()));
        if let Some(method) = case["method"].as_str() {
            config = config.method(method);
        }

        let xhr = dispatch(&mut config);
        let opened = xhr.transport().opened();
        assert_eq!(opened.len(), 1, "{name}: open called once");

        let (method, url, asynchronous) = &opened[0];
        let expected_method = case["method"].as_str().map(HttpMethod::from).unwrap_or_default();
        assert_eq!(*method, expected_method, "{name}: method");
        assert_eq!(url, case["expected_url"].as_str().unwrap(), "{name}: url");
        assert!(asynchronous, "{name}: asynchronous");
    }
}

// ---------------------------------------------------------------------------
// Accept
// ---------------------------------------------------------------------------

#[test]
fn accept_test_vectors() {
    let raw = include_str!("../../test-vectors/accept.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut config = RequestConfig::<MockTransport>::new("test");
        if let Some(data_type) = case["data_type"].as_str() {
            config = config.data_type(data_type);
        }
        if let Some(accept) = case["accept"].as_str() {
            config = config.header("Accept", accept);
        }

        let xhr = dispatch(&mut config);
        let accepts: Vec<String> = xhr
            .transport()
            .request_headers()
            .into_iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("accept"))
            .map(|(_, v)| v)
            .collect();
        assert_eq!(
            accepts,
            vec![case["expected"].as_str().unwrap().to_string()],
            "{name}: Accept set exactly once"
        );
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

#[test]
fn decode_test_vectors() {
    let raw = include_str!("../../test-vectors/decode.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let xhr = MockTransport::new();
        if let Some(content_type) = case["content_type"].as_str() {
            xhr.set_response_header("Content-Type", content_type);
        }
        xhr.set_response_body(case["body"].as_str().unwrap());

        let result = decode::decode(case["accept"].as_str(), &xhr);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Json" => assert!(matches!(err, DecodeError::Json(_)), "{name}: expected Json error"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let data = result.unwrap();
        let expected = &case["expected"];
        if let Some(json) = expected.get("json") {
            assert_eq!(data, ResponseData::Json(json.clone()), "{name}: json");
        } else if let Some(text) = expected.get("text") {
            assert_eq!(data.as_text(), text.as_str(), "{name}: text");
        } else if let Some(doc) = expected.get("document") {
            assert_eq!(data.as_document().map(String::as_str), doc.as_str(), "{name}: document");
        } else {
            panic!("{name}: vector has no expectation");
        }
    }
}
