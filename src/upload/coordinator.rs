use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::api::PhotoRecord;
use crate::upload::picker::PendingFile;
use crate::upload::types::{BatchProgress, BatchReport, UploadEvent, UploadEventKind, UploadTask};

/// How many uploads run at once. The service copes fine with a guest
/// pushing a handful of photos in parallel, but a phone dumping a whole
/// camera roll should not open one connection per file.
pub const MAX_CONCURRENT_UPLOADS: usize = 4;

/// Runs one batch of uploads at a time on a bounded worker pool. Workers
/// report per-task events over a channel; `poll` applies them on the UI
/// thread and finalizes the batch once every task is terminal. A finished
/// batch leaves no state behind.
pub struct UploadCoordinator {
    tasks: Vec<UploadTask>,
    batch_started: Option<Instant>,
    event_tx: Sender<UploadEvent>,
    event_rx: Receiver<UploadEvent>,
}

impl UploadCoordinator {
    pub fn new() -> Self {
        let (event_tx, event_rx) = channel();
        Self {
            tasks: Vec::new(),
            batch_started: None,
            event_tx,
            event_rx,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    /// Start uploading a batch. Rejects an empty batch, and rejects a new
    /// batch while one is still running. The upload closure is called once
    /// per file on a worker thread with a callback for cumulative byte
    /// progress; one file's failure never touches its siblings.
    pub fn submit<U>(&mut self, files: Vec<PendingFile>, upload: U) -> bool
    where
        U: Fn(&PendingFile, Box<dyn FnMut(u64) + Send>) -> Result<PhotoRecord, String>
            + Send
            + Sync
            + 'static,
    {
        if files.is_empty() || self.is_active() {
            return false;
        }

        self.tasks = files.iter().map(UploadTask::new).collect();
        self.batch_started = Some(Instant::now());

        let jobs: VecDeque<(usize, PendingFile)> = files.into_iter().enumerate().collect();
        let workers = MAX_CONCURRENT_UPLOADS.min(jobs.len());
        println!(
            "Starting upload batch: {} files on {} workers",
            self.tasks.len(),
            workers
        );

        let jobs = Arc::new(Mutex::new(jobs));
        let upload = Arc::new(upload);
        for _ in 0..workers {
            let jobs = Arc::clone(&jobs);
            let upload = Arc::clone(&upload);
            let event_tx = self.event_tx.clone();
            std::thread::spawn(move || loop {
                let job = jobs.lock().unwrap().pop_front();
                let Some((index, file)) = job else {
                    break;
                };

                let _ = event_tx.send(UploadEvent {
                    task: index,
                    kind: UploadEventKind::Started,
                });

                let progress_tx = event_tx.clone();
                let on_progress: Box<dyn FnMut(u64) + Send> = Box::new(move |sent| {
                    let _ = progress_tx.send(UploadEvent {
                        task: index,
                        kind: UploadEventKind::Progress(sent),
                    });
                });

                let outcome = upload(&file, on_progress);
                let _ = event_tx.send(UploadEvent {
                    task: index,
                    kind: UploadEventKind::Finished(outcome),
                });
            });
        }
        true
    }

    /// Drain worker events. Once the last task lands, returns the
    /// finalized report (outcomes in submission order, whatever order the
    /// uploads finished in) and clears the coordinator for the next batch.
    pub fn poll(&mut self) -> Option<BatchReport> {
        if self.tasks.is_empty() {
            return None;
        }

        while let Ok(event) = self.event_rx.try_recv() {
            event.apply(&mut self.tasks);
        }

        if self.tasks.iter().all(UploadTask::is_terminal) {
            let report = BatchReport::from_tasks(std::mem::take(&mut self.tasks));
            self.batch_started = None;
            println!("Upload batch finished: {}", report.summary());
            Some(report)
        } else {
            None
        }
    }

    /// Live aggregate for the active batch, or `None` between batches.
    pub fn progress(&self) -> Option<BatchProgress> {
        let started = self.batch_started?;
        Some(BatchProgress::compute(&self.tasks, started.elapsed()))
    }
}

impl Default for UploadCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
