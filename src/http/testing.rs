use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::transport::{Transport, TransportResult};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub route: String,
    pub user_agent: String,
    pub payload: Vec<u8>,
    pub timeout: Duration,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

/// Replays canned results in order and records every request it sees.
/// Once the script runs out every further post fails with status 0.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<TransportResult>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<TransportResult>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn routes(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.route).collect()
    }
}

impl Transport for ScriptedTransport {
    fn post(&self, route: &str, user_agent: &str, payload: &[u8], timeout: Duration) -> TransportResult {
        self.requests.lock().unwrap().push(RecordedRequest {
            route: route.to_string(),
            user_agent: user_agent.to_string(),
            payload: payload.to_vec(),
            timeout,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(TransportResult::failed)
    }
}

/// A 200 JSON response.
pub fn ok_json(body: &str) -> TransportResult {
    TransportResult::new(200, body, "application/json")
}

pub fn status(code: u16) -> TransportResult {
    TransportResult::new(code, "", "")
}
