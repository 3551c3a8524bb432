#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::MockServer;

use umi_ocr::{ClientConfig, UmiClient};

pub fn client_for(server: &MockServer) -> UmiClient {
    UmiClient::new(&ClientConfig::with_base_url(server.uri())).expect("client")
}

/// One dict-format page with a single text line.
pub fn page(number: u32, text: &str) -> Value {
    json!({
        "page": number,
        "code": 100,
        "data": [{
            "box": [[10, 10], [200, 10], [200, 40], [10, 40]],
            "score": 0.95,
            "text": text,
            "end": "\n"
        }],
        "score": 0.95,
        "time": 0.4,
        "timestamp": 1_711_111_111.0
    })
}

/// A page the service found no text on.
pub fn blank_page(number: u32) -> Value {
    json!({
        "page": number,
        "code": 101,
        "data": "",
        "score": 0,
        "time": 0.1,
        "timestamp": 1_711_111_111.0
    })
}

pub fn status(state: &str, processed: u32, pages: u32, data: Vec<Value>) -> Value {
    json!({
        "code": 100,
        "data": data,
        "processed_count": processed,
        "pages_count": pages,
        "is_done": matches!(state, "success" | "failure"),
        "state": state
    })
}
