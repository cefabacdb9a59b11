// Shared test helpers for mock servers and parameter mappings.

use httptest::{Server, ServerBuilder};
use loco_http::{Config, Executor};
use serde_json::{Map, Value};

/// Starts a mock server bound to IPv4 loopback.
#[allow(dead_code)] // Used by other test files
pub fn ipv4_server() -> Server {
    ServerBuilder::new()
        .bind_addr("127.0.0.1:0".parse().expect("valid bind address"))
        .run()
        .expect("Failed to start mock server")
}

/// Absolute URL for `path` on `server`.
#[allow(dead_code)]
pub fn url(server: &Server, path: &str) -> String {
    format!("http://{}{}", server.addr(), path)
}

/// Unwraps a `json!` object literal into a parameter mapping.
#[allow(dead_code)]
pub fn mapping(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Executor with default configuration and its own session registry.
#[allow(dead_code)]
pub fn executor() -> Executor {
    Executor::new(Config::default()).expect("default config is valid")
}
