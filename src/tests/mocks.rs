//! Mock implementations for testing

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::client::{ApiReply, ApiRequest, Transport};
use crate::error::{PanoramaError, Result};

#[derive(Debug, Clone)]
enum Scripted {
    Reply(ApiReply),
    Fail(String),
}

/// Scripted transport
///
/// Replies are queued per endpoint and consumed in order; the last one
/// queued for an endpoint keeps answering once the others are used up.
/// Endpoints with nothing queued answer 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, endpoint: &str, status: u16, body: serde_json::Value) {
        self.respond_raw(endpoint, status, &body.to_string());
    }

    pub fn respond_raw(&self, endpoint: &str, status: u16, body: &str) {
        self.push(
            endpoint,
            Scripted::Reply(ApiReply {
                status,
                body: body.to_string(),
            }),
        );
    }

    /// Fail at the transport level, as a refused connection would
    pub fn fail(&self, endpoint: &str, message: &str) {
        self.push(endpoint, Scripted::Fail(message.to_string()));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .count()
    }

    fn push(&self, endpoint: &str, scripted: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(scripted);
    }

    fn next_for(&self, endpoint: &str) -> Option<Scripted> {
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(endpoint)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiReply> {
        self.requests.lock().unwrap().push(request.clone());
        let scripted = self.next_for(&request.endpoint);

        // Let other in-flight requests run, as a real round trip would.
        tokio::task::yield_now().await;

        match scripted {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(message)) => Err(PanoramaError::network(message)),
            None => Ok(ApiReply {
                status: 404,
                body: r#"{"error":"no mock response"}"#.to_string(),
            }),
        }
    }
}
