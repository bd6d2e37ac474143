use std::time::Duration;

use crate::api::PhotoRecord;
use crate::upload::picker::PendingFile;

/// Throughput and ETA are meaningless until the batch clock has run for a
/// moment; below this the progress line shows a placeholder instead.
const MIN_ELAPSED_SECS: f64 = 0.5;

const GENERIC_UPLOAD_ERROR: &str = "Upload failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

/// One file's slot in the active batch. Mutated only by its own upload's
/// events; discarded when the batch finalizes.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub file_key: String,
    pub file_name: String,
    pub bytes_total: u64,
    pub bytes_sent: u64,
    pub state: TaskState,
    pub error: Option<String>,
    pub record: Option<PhotoRecord>,
}

impl UploadTask {
    pub fn new(file: &PendingFile) -> Self {
        Self {
            file_key: file.file_key(),
            file_name: file.name.clone(),
            bytes_total: file.size,
            bytes_sent: 0,
            state: TaskState::Pending,
            error: None,
            record: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TaskState::Succeeded | TaskState::Failed)
    }

    pub fn fraction(&self) -> f32 {
        if self.bytes_total == 0 {
            return if self.is_terminal() { 1.0 } else { 0.0 };
        }
        (self.bytes_sent.min(self.bytes_total) as f32) / self.bytes_total as f32
    }
}

/// Status message from an upload worker, routed to the task at the given
/// submission index.
#[derive(Debug)]
pub struct UploadEvent {
    pub task: usize,
    pub kind: UploadEventKind,
}

#[derive(Debug)]
pub enum UploadEventKind {
    Started,
    Progress(u64),
    Finished(Result<PhotoRecord, String>),
}

impl UploadEvent {
    /// Fold this event into the task it belongs to. Progress is clamped to
    /// the task's own total and never runs backwards, so the aggregate can
    /// never exceed the batch total whatever a transport reports.
    pub fn apply(self, tasks: &mut [UploadTask]) {
        let Some(task) = tasks.get_mut(self.task) else {
            return;
        };
        match self.kind {
            UploadEventKind::Started => {
                if task.state == TaskState::Pending {
                    task.state = TaskState::InFlight;
                }
            }
            UploadEventKind::Progress(sent) => {
                let sent = sent.min(task.bytes_total);
                if sent > task.bytes_sent {
                    task.bytes_sent = sent;
                }
            }
            UploadEventKind::Finished(Ok(record)) => {
                task.bytes_sent = task.bytes_total;
                task.state = TaskState::Succeeded;
                task.record = Some(record);
            }
            UploadEventKind::Finished(Err(message)) => {
                task.state = TaskState::Failed;
                task.error = Some(if message.is_empty() {
                    GENERIC_UPLOAD_ERROR.to_string()
                } else {
                    message
                });
            }
        }
    }
}

/// Aggregate view of the active batch, recomputed from the task list on
/// demand and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    pub files_total: usize,
    pub files_done: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub bytes_sent: u64,
    pub bytes_total: u64,
    /// Bytes per second; `None` until enough time has elapsed to measure.
    pub throughput: Option<f64>,
    pub eta: Option<Duration>,
}

impl BatchProgress {
    pub fn compute(tasks: &[UploadTask], elapsed: Duration) -> Self {
        let bytes_total: u64 = tasks.iter().map(|t| t.bytes_total).sum();
        let bytes_sent: u64 = tasks.iter().map(|t| t.bytes_sent.min(t.bytes_total)).sum();
        let files_done = tasks.iter().filter(|t| t.is_terminal()).count();
        let succeeded = tasks
            .iter()
            .filter(|t| t.state == TaskState::Succeeded)
            .count();
        let failed = tasks.iter().filter(|t| t.state == TaskState::Failed).count();

        let secs = elapsed.as_secs_f64();
        let throughput = if secs < MIN_ELAPSED_SECS || bytes_sent == 0 {
            None
        } else {
            Some(bytes_sent as f64 / secs)
        };
        let eta = throughput.and_then(|rate| {
            if rate > 0.0 {
                let remaining = bytes_total.saturating_sub(bytes_sent) as f64;
                Some(Duration::from_secs_f64(remaining / rate))
            } else {
                None
            }
        });

        Self {
            files_total: tasks.len(),
            files_done,
            succeeded,
            failed,
            bytes_sent,
            bytes_total,
            throughput,
            eta,
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.bytes_total == 0 {
            return 0.0;
        }
        self.bytes_sent as f32 / self.bytes_total as f32
    }
}

/// One file's final fate, reported in submission order.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub file_name: String,
    pub success: bool,
    pub error: Option<String>,
    pub record: Option<PhotoRecord>,
}

/// Immutable result of a finished batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl BatchReport {
    pub fn from_tasks(tasks: Vec<UploadTask>) -> Self {
        let outcomes = tasks
            .into_iter()
            .map(|task| UploadOutcome {
                file_name: task.file_name,
                success: task.state == TaskState::Succeeded,
                error: task.error,
                record: task.record,
            })
            .collect();
        Self { outcomes }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn summary(&self) -> String {
        format!("{} succeeded, {} failed", self.succeeded(), self.failed())
    }
}
