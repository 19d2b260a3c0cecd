use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use whalewatch::error::Result;
use whalewatch::port::NotificationChannel;

/// A delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub endpoint: String,
    pub message: String,
}

/// Thread-safe channel that records every send and answers from a script.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    sent: Arc<Mutex<Vec<Sent>>>,
    script: Arc<Mutex<VecDeque<Result<bool>>>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next send. Unscripted sends succeed.
    pub fn push_result(&self, result: Result<bool>) {
        self.script.lock().push_back(result);
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, endpoint_id: &str, message: &str) -> Result<bool> {
        self.sent.lock().push(Sent {
            endpoint: endpoint_id.to_string(),
            message: message.to_string(),
        });
        self.script.lock().pop_front().unwrap_or(Ok(true))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
