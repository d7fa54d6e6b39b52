//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    path::PathBuf,
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pipeline::{
    ArtifactPath, ArtifactStore, Clock, Completion, CompletionRequest, LlmError, LlmProvider,
    PersistError, Timestamp,
};

/// Replays a fixed script of replies, one per call, recording every request.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A script where every call succeeds.
    pub fn replying<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self::new(replies.into_iter().map(|reply| Ok(reply.into())))
    }

    /// Rendered prompts, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.prompt().to_string())
            .collect()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::MalformedResponse {
                    message: "script exhausted".to_string(),
                })
            })?;
        Ok(Completion {
            text: reply,
            model: "scripted".to_string(),
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Keeps persisted documents in memory; optionally refuses every write.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, String>>,
    writes: Mutex<usize>,
    fail: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn persist(&self, path: &ArtifactPath, contents: &str) -> Result<PathBuf, PersistError> {
        *self.writes.lock().unwrap() += 1;
        if self.fail {
            return Err(PersistError {
                path: PathBuf::from(path.as_str()),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), contents.to_string());
        Ok(PathBuf::from(path.as_str()))
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub Timestamp);

impl FixedClock {
    pub fn at_noon() -> Self {
        Self(Timestamp::from_utc(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
