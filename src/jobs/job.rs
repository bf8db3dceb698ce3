use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::capture::CapturedImage;

use super::{
    context::JobContext,
    dependencies::JobDependencies,
    processors::{CaptureStageProcessor, StageProcessor, UploadStageProcessor},
    settings::{JobKind, JobSettings},
    types::{JobError, JobEvent, JobId, JobInfo, JobStatus},
};

/// Called once with the finished job, after its `Completed` event.
pub(crate) type CompletionHook = Box<dyn Fn(&Arc<Job>) + Send + Sync>;

/// How the pipeline body ended when it did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Finished,
    /// Cancellation observed at the checkpoint before the named stage.
    Cancelled(&'static str),
}

/// One run of the capture-to-upload pipeline.
///
/// Status only changes from the job's own task, except for the `Stopping`
/// announcement made by [`Job::request_stop`].
pub struct Job {
    id: JobId,
    settings: JobSettings,
    dependencies: JobDependencies,
    status: Mutex<JobStatus>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<JobEvent>>>,
    /// Published copy of the pipeline's context, updated at stage boundaries.
    context: Mutex<JobContext>,
    cancel: CancellationToken,
    on_complete: Option<CompletionHook>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Job {
    pub fn new(id: JobId, settings: JobSettings, dependencies: JobDependencies) -> Self {
        Self {
            id,
            settings,
            dependencies,
            status: Mutex::new(JobStatus::Queued),
            subscribers: Mutex::new(Vec::new()),
            context: Mutex::new(JobContext::new()),
            cancel: CancellationToken::new(),
            on_complete: None,
        }
    }

    /// Run the pipeline on `image` instead of capturing one.
    pub fn with_input_image(self, image: CapturedImage) -> Self {
        lock(&self.context).image = Some(image);
        self
    }

    pub(crate) fn with_completion_hook(mut self, hook: CompletionHook) -> Self {
        self.on_complete = Some(hook);
        self
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.settings.job
    }

    pub fn status(&self) -> JobStatus {
        *lock(&self.status)
    }

    /// True while `Preparing`, `Working` or `Stopping`.
    pub fn is_working(&self) -> bool {
        self.status().is_working()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Receive every status change and the final completion event.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<JobEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    /// Copy of the context as of the last finished step.
    pub fn context(&self) -> JobContext {
        lock(&self.context).clone()
    }

    pub fn info(&self) -> JobInfo {
        let context = lock(&self.context);
        JobInfo {
            id: self.id,
            kind: self.settings.job,
            status: self.status(),
            started_at: context.started_at,
            file_path: context.file_path.clone(),
            url: context.url().map(str::to_owned),
        }
    }

    /// Move the job to `Preparing` and start its pipeline on a tokio task.
    ///
    /// The task owns the job from here on: it sets the terminal status,
    /// emits `Completed` and runs the completion hook whether or not the
    /// handle is awaited. Returns `None` if the job had already been started.
    pub fn spawn(self: &Arc<Self>) -> Option<JoinHandle<JobStatus>> {
        {
            let mut status = lock(&self.status);
            if *status != JobStatus::Queued {
                log::warn!("Job {} already started (status: {})", self.id, *status);
                return None;
            }
            self.transition(&mut status, JobStatus::Preparing);
        }

        lock(&self.context).started_at = Local::now();
        log::info!(
            "Job {} started: {} {:?}",
            self.id,
            self.settings.job,
            self.settings.after_capture
        );

        let job = Arc::clone(self);
        Some(tokio::spawn(async move {
            let body = Arc::clone(&job);
            // A panic in the body surfaces here as a join error.
            let outcome = tokio::spawn(async move { body.execute().await })
                .await
                .unwrap_or_else(|e| Err(JobError::Task(format!("job task aborted: {}", e))));

            let terminal = job.finish(outcome);
            if let Some(hook) = &job.on_complete {
                hook(&job);
            }
            terminal
        }))
    }

    /// Start the job and wait for its terminal status.
    ///
    /// Errors and panics from the pipeline end the job as `Failed` and never
    /// propagate to the caller. Dropping this future does not affect the job.
    /// Returns `None` if the job had already been started.
    pub async fn run(self: &Arc<Self>) -> Option<JobStatus> {
        let handle = self.spawn()?;
        Some(handle.await.unwrap_or_else(|e| {
            log::error!("Job {} lifecycle task failed: {}", self.id, e);
            self.status()
        }))
    }

    /// Ask a running job to stop at its next checkpoint.
    ///
    /// No-op unless the job is `Preparing`, `Working` or `Stopping`.
    pub fn request_stop(&self) {
        let mut status = lock(&self.status);
        if !status.is_working() {
            return;
        }
        if *status != JobStatus::Stopping {
            self.transition(&mut status, JobStatus::Stopping);
            log::info!("Stop requested for job {}", self.id);
        }
        self.cancel.cancel();
    }

    async fn execute(&self) -> Result<Flow, JobError> {
        if self.cancel.is_cancelled() {
            return Ok(Flow::Cancelled("capture"));
        }
        self.advance_to_working();

        // Stages work on a private copy; readers see it at stage boundaries.
        let mut context = self.context();
        if context.has_image() {
            log::info!("Job {} runs on a supplied image, skipping capture", self.id);
        } else {
            context.image = self.capture().await;
            self.publish(&context);
        }

        let stages: [Box<dyn StageProcessor>; 2] = [
            Box::new(CaptureStageProcessor::new(&self.settings, &self.dependencies)),
            Box::new(UploadStageProcessor::new(&self.settings, &self.dependencies)),
        ];
        for stage in stages {
            if self.cancel.is_cancelled() {
                return Ok(Flow::Cancelled(stage.name()));
            }
            let result = stage.process(&mut context, &self.cancel).await;
            // Partial progress stays visible when a stage fails.
            self.publish(&context);
            result?;
        }

        Ok(Flow::Finished)
    }

    /// Capture never fails the job: errors and empty results leave the
    /// context without an image, which turns image-dependent actions into
    /// no-ops.
    async fn capture(&self) -> Option<CapturedImage> {
        let capture = &self.dependencies.capture;
        let result = match self.settings.job {
            JobKind::FullScreen => capture.capture_full_screen().await,
            JobKind::RectangleRegion => capture.capture_region().await,
            JobKind::ActiveWindow => capture.capture_active_window().await,
        };

        match result {
            Ok(Some(image)) => {
                log::info!(
                    "Job {} captured {}x{} image ({} bytes)",
                    self.id,
                    image.width,
                    image.height,
                    image.len()
                );
                Some(image)
            }
            Ok(None) => {
                log::info!(
                    "Job {}: capture returned nothing for {}",
                    self.id,
                    self.settings.job
                );
                None
            }
            Err(e) => {
                log::warn!(
                    "Job {}: {} capture failed, continuing without image: {}",
                    self.id,
                    self.settings.job,
                    e
                );
                None
            }
        }
    }

    fn publish(&self, context: &JobContext) {
        *lock(&self.context) = context.clone();
    }

    fn advance_to_working(&self) {
        let mut status = lock(&self.status);
        // A stop request during Preparing keeps the job in Stopping.
        if *status == JobStatus::Preparing {
            self.transition(&mut status, JobStatus::Working);
        }
    }

    fn finish(&self, outcome: Result<Flow, JobError>) -> JobStatus {
        let terminal = {
            let mut status = lock(&self.status);
            let terminal = match &outcome {
                Err(_) => JobStatus::Failed,
                Ok(Flow::Cancelled(_)) => JobStatus::Stopped,
                // A stop that arrived after the last checkpoint still wins.
                Ok(Flow::Finished) if *status == JobStatus::Stopping => JobStatus::Stopped,
                Ok(Flow::Finished) => JobStatus::Completed,
            };
            self.transition(&mut status, terminal);
            terminal
        };

        match outcome {
            Ok(Flow::Finished) if terminal == JobStatus::Completed => {
                log::info!("Job {} completed", self.id)
            }
            Ok(Flow::Finished) => log::info!("Job {} stopped after its last stage", self.id),
            Ok(Flow::Cancelled(stage)) => {
                log::info!("Job {} stopped before the {} stage", self.id, stage)
            }
            Err(e) => log::error!("Job {} ({}) failed: {}", self.id, self.settings.job, e),
        }

        self.emit(JobEvent::Completed(terminal));
        terminal
    }

    /// Caller holds the status lock so events leave in transition order.
    fn transition(&self, status: &mut MutexGuard<'_, JobStatus>, next: JobStatus) {
        log::debug!("Job {}: {} -> {}", self.id, **status, next);
        **status = next;
        self.emit(JobEvent::StatusChanged(next));
    }

    fn emit(&self, event: JobEvent) {
        lock(&self.subscribers).retain(|tx| tx.send(event).is_ok());
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("kind", &self.settings.job)
            .field("status", &self.status())
            .finish()
    }
}
