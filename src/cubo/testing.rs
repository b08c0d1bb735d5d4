//! Scripted transport for tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::TransportError;

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<ApiResponse, TransportError>>,
    requests: Vec<ApiRequest>,
    attempt_times: Vec<Instant>,
}

/// Replays queued replies in order and records every request it sees.
/// Once the queue is empty every attempt fails with a connection error.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, status: u16, body: Value) {
        self.script
            .lock()
            .unwrap()
            .replies
            .push_back(Ok(ApiResponse::new(status, body)));
    }

    pub fn push_err(&self, err: TransportError) {
        self.script.lock().unwrap().replies.push_back(Err(err));
    }

    pub fn attempts(&self) -> usize {
        self.script.lock().unwrap().requests.len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.script.lock().unwrap().attempt_times.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request);
        script.attempt_times.push(Instant::now());
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("script exhausted".to_string())))
    }
}
