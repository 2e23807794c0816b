//! Stub collaborators for engine unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use super::{Dispatch, DispatchError, ExportSink, Pause, PreparedRequest, RawResponse, TestCase};

/// Active GET case against `api.local`
pub fn case(id: &str, title: &str, path: &str, checkpoint: &str) -> TestCase {
    TestCase {
        id: id.to_string(),
        title: title.to_string(),
        is_active: true,
        host: "api.local".to_string(),
        path: path.to_string(),
        method: "get".to_string(),
        checkpoint: checkpoint.to_string(),
        ..Default::default()
    }
}

/// Replays scripted replies in order and records every request
#[derive(Default)]
pub struct ScriptedDispatch {
    replies: Mutex<VecDeque<Result<RawResponse, DispatchError>>>,
    sent: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedDispatch {
    pub fn new(replies: Vec<Result<RawResponse, DispatchError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<PreparedRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatch for ScriptedDispatch {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, DispatchError> {
        self.sent.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DispatchError::Transport("no scripted reply".to_string())))
    }
}

/// Records requested pauses without waiting
#[derive(Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn recorded(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

/// Keeps exported files in memory
#[derive(Default)]
pub struct MemoryExportSink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryExportSink {
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl ExportSink for MemoryExportSink {
    fn save(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(name))
    }
}
