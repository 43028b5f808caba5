//! Scripted in-memory [`ReceiptService`] for orchestration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reciva_client::responses::{
    BulkSubmitResponse, BulkTask, SubmitResponse, TaskResult, TaskState, TaskStatusResponse,
};
use reciva_client::{ExtractionApiError, ReceiptService};
use reciva_core::receipt::ExtractionResult;

/// One scripted reply from the fake status endpoint.
#[derive(Clone)]
pub enum Scripted {
    Reply(TaskStatusResponse),
    /// Simulated transport-level failure (served as HTTP 503).
    Blip,
}

impl Scripted {
    pub fn pending(text: &str) -> Self {
        Self::Reply(TaskStatusResponse {
            state: TaskState::Pending,
            status: Some(text.into()),
            result: None,
            error: None,
        })
    }

    pub fn running() -> Self {
        Self::Reply(TaskStatusResponse {
            state: TaskState::Running,
            status: None,
            result: None,
            error: None,
        })
    }

    pub fn success(total: f64) -> Self {
        Self::Reply(TaskStatusResponse {
            state: TaskState::Success,
            status: None,
            result: Some(TaskResult {
                data: ExtractionResult {
                    total: Some(total),
                    ..Default::default()
                },
            }),
            error: None,
        })
    }

    pub fn failure(reason: &str) -> Self {
        Self::Reply(TaskStatusResponse {
            state: TaskState::Failure,
            status: None,
            result: None,
            error: Some(reason.into()),
        })
    }
}

/// In-memory service with scripted replies.
///
/// Status scripts are consumed one reply per query; the last reply
/// repeats once the script is exhausted, so a task parked on
/// `running()` stays running until the test replaces its script.
#[derive(Default)]
pub struct FakeService {
    scripts: Mutex<HashMap<String, (Vec<Scripted>, usize)>>,
    bulk: Mutex<Option<Vec<BulkTask>>>,
    single: Mutex<Option<String>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to the next bulk submission with these items.
    pub fn respond_bulk(&self, items: Vec<BulkTask>) {
        *self.bulk.lock().unwrap() = Some(items);
    }

    /// Fail bulk submissions at the transport level.
    pub fn fail_bulk(&self) {
        *self.bulk.lock().unwrap() = None;
    }

    /// Respond to single submissions with this task identifier.
    pub fn respond_single(&self, task_id: &str) {
        *self.single.lock().unwrap() = Some(task_id.into());
    }

    /// Fail single submissions at the transport level.
    pub fn fail_single(&self) {
        *self.single.lock().unwrap() = None;
    }

    /// Install (or replace) the reply script for a task.
    pub fn set_script(&self, task_id: &str, replies: Vec<Scripted>) {
        assert!(!replies.is_empty(), "scripts must have at least one reply");
        self.scripts
            .lock()
            .unwrap()
            .insert(task_id.to_string(), (replies, 0));
    }

    pub fn queued(filename: &str, task_id: &str) -> BulkTask {
        BulkTask {
            filename: filename.into(),
            task_id: Some(task_id.into()),
            error: None,
        }
    }

    pub fn rejected(filename: &str, reason: &str) -> BulkTask {
        BulkTask {
            filename: filename.into(),
            task_id: None,
            error: Some(reason.into()),
        }
    }

    fn unavailable() -> ExtractionApiError {
        ExtractionApiError::Api {
            status: 503,
            body: "service unavailable".into(),
        }
    }
}

#[async_trait]
impl ReceiptService for FakeService {
    async fn submit_receipt(
        &self,
        _filename: &str,
        _payload: Vec<u8>,
        _generate_summary: bool,
    ) -> Result<SubmitResponse, ExtractionApiError> {
        match self.single.lock().unwrap().clone() {
            Some(task_id) => Ok(SubmitResponse { task_id }),
            None => Err(Self::unavailable()),
        }
    }

    async fn submit_receipts_bulk(
        &self,
        _files: Vec<(String, Vec<u8>)>,
        _generate_summary: bool,
    ) -> Result<BulkSubmitResponse, ExtractionApiError> {
        match self.bulk.lock().unwrap().clone() {
            Some(tasks) => Ok(BulkSubmitResponse {
                batch_id: None,
                tasks,
            }),
            None => Err(Self::unavailable()),
        }
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse, ExtractionApiError> {
        let mut scripts = self.scripts.lock().unwrap();
        let Some((replies, cursor)) = scripts.get_mut(task_id) else {
            return Err(ExtractionApiError::Api {
                status: 404,
                body: format!("unknown task {task_id}"),
            });
        };

        let index = (*cursor).min(replies.len() - 1);
        *cursor += 1;
        match replies[index].clone() {
            Scripted::Reply(response) => Ok(response),
            Scripted::Blip => Err(Self::unavailable()),
        }
    }
}
