//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::http::{HttpRequest, HttpResponse, HttpTransport, TransportError};

type ResponseQueue = Arc<Mutex<VecDeque<Result<HttpResponse, TransportError>>>>;
type RequestLog = Arc<Mutex<Vec<HttpRequest>>>;

/// Scripted [`HttpTransport`] that answers from a FIFO queue.
///
/// Clones share the queue and the request log, so a test can keep one
/// handle while the code under test owns another.
///
/// # Examples
///
/// ```
/// use envato_common::testing::MockTransport;
/// use serde_json::json;
///
/// let transport = MockTransport::new();
/// transport.push_json(200, json!({ "matches": [] }));
/// transport.push_json(429, json!({}));
///
/// assert_eq!(transport.pending(), 2);
/// assert_eq!(transport.request_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: ResponseQueue,
    requests: RequestLog,
}

impl MockTransport {
    /// Create a mock transport with an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response
    pub fn push(&self, response: HttpResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queue a JSON response with the given status
    pub fn push_json(&self, status: u16, body: Value) {
        self.push(HttpResponse::new(status, body.to_string()));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Number of queued responses not yet consumed
    #[must_use]
    pub fn pending(&self) -> usize {
        self.responses.lock().len()
    }

    /// Get all requests that were made
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Get the number of requests made
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Get the last request made
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    /// Clear all recorded requests
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        self.requests.lock().push(request);
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::Request(format!("no mock response queued for {url}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_answers_in_order_and_records_requests() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({ "first": true }));
        transport.push(HttpResponse::new(404, "missing"));

        let first = transport
            .send(HttpRequest::new(Method::GET, "https://api.envato.com/a"))
            .await
            .unwrap();
        let second = transport
            .send(HttpRequest::new(Method::GET, "https://api.envato.com/b"))
            .await
            .unwrap();

        assert_eq!(first.json(), Some(json!({ "first": true })));
        assert_eq!(second.status, 404);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(transport.last_request().unwrap().url, "https://api.envato.com/b");
    }

    #[tokio::test]
    async fn test_empty_queue_is_a_transport_error() {
        let transport = MockTransport::new();
        let result = transport.send(HttpRequest::new(Method::GET, "https://api.envato.com/")).await;

        assert!(matches!(result, Err(TransportError::Request(_))));
        assert_eq!(transport.request_count(), 1);
        transport.clear_requests();
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let transport = MockTransport::new();
        let handle = transport.clone();
        transport.push_error(TransportError::Timeout("slow".into()));

        assert_eq!(handle.pending(), 1);
        let request = HttpRequest::new(Method::POST, "https://api.envato.com/token");
        let result = handle.send(request).await;
        assert!(matches!(result, Err(TransportError::Timeout(_))));
        assert_eq!(transport.request_count(), 1);
    }
}
