//! In-memory `GraphApi` used by unit tests

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use super::client::{reveal_path, GraphApi};
use crate::error::{BackupError, BackupResult};

enum Reply {
    Json(Value),
    Permission(String),
    Transport(String),
}

/// Serves canned replies keyed by exact URL and records every request
#[derive(Default)]
pub struct FakeGraph {
    replies: HashMap<String, Reply>,
    requests: RefCell<Vec<String>>,
}

impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, url: &str, body: Value) -> Self {
        self.replies.insert(url.to_string(), Reply::Json(body));
        self
    }

    /// Single-page collection
    pub fn with_collection(self, url: &str, items: Vec<Value>) -> Self {
        self.with_json(url, serde_json::json!({ "value": items }))
    }

    pub fn with_transport_error(mut self, url: &str, message: &str) -> Self {
        self.replies
            .insert(url.to_string(), Reply::Transport(message.to_string()));
        self
    }

    pub fn with_secret(self, configuration_id: &str, reference: &str, plaintext: &str) -> Self {
        self.with_json(
            &reveal_path(configuration_id, reference),
            serde_json::json!({ "value": plaintext }),
        )
    }

    pub fn with_secret_denied(mut self, configuration_id: &str, reference: &str, message: &str) -> Self {
        self.replies.insert(
            reveal_path(configuration_id, reference),
            Reply::Permission(message.to_string()),
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl GraphApi for FakeGraph {
    fn get(&self, url: &str) -> BackupResult<Value> {
        self.requests.borrow_mut().push(url.to_string());
        match self.replies.get(url) {
            Some(Reply::Json(body)) => Ok(body.clone()),
            Some(Reply::Permission(message)) => Err(BackupError::Permission(message.clone())),
            Some(Reply::Transport(message)) => Err(BackupError::Transport(message.clone())),
            None => Err(BackupError::Transport(format!("404 Not Found: {}", url))),
        }
    }
}
