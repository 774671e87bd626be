//! Test helpers shared by the HTTP client tests

use wiremock::ResponseTemplate;

/// A local URL with nothing listening behind it
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

/// JSON response with the given status and raw body
pub fn json_response(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json")
}

/// Run a blocking HTTP call off the async runtime that drives the mock server
pub async fn blocking<T, F>(call: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(call).await.expect("blocking call panicked")
}
