use std::sync::{
    Arc, Mutex, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::mpsc;

use crate::capture::CapturedImage;

use super::{
    dependencies::JobDependencies,
    job::Job,
    settings::JobSettings,
    types::{JobId, JobStatus},
};

type Listeners = Arc<Mutex<Vec<mpsc::UnboundedSender<Arc<Job>>>>>;

/// Creates jobs, keeps every job for the lifetime of the registry, and
/// re-broadcasts completions.
///
/// Built once by the application and shared as `Arc<JobRegistry>`.
pub struct JobRegistry {
    dependencies: JobDependencies,
    jobs: RwLock<Vec<Arc<Job>>>,
    next_id: AtomicU64,
    listeners: Listeners,
}

impl JobRegistry {
    pub fn new(dependencies: JobDependencies) -> Self {
        Self {
            dependencies,
            jobs: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            listeners: Arc::default(),
        }
    }

    /// Register a new `Queued` job without running it.
    pub fn enqueue(&self, settings: JobSettings) -> Arc<Job> {
        self.register(settings, None)
    }

    /// Register a `Queued` job that processes `image` instead of capturing.
    pub fn enqueue_with_image(&self, settings: JobSettings, image: CapturedImage) -> Arc<Job> {
        self.register(settings, Some(image))
    }

    fn register(&self, settings: JobSettings, image: Option<CapturedImage>) -> Arc<Job> {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listeners = Arc::clone(&self.listeners);
        let mut job = Job::new(id, settings, self.dependencies.clone())
            .with_completion_hook(Box::new(move |job: &Arc<Job>| broadcast(&listeners, job)));
        if let Some(image) = image {
            job = job.with_input_image(image);
        }
        let job = Arc::new(job);
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&job));
        log::debug!("Registered job {} ({})", id, job.kind());
        job
    }

    /// Register a job and drive it to a terminal status.
    ///
    /// The job is listed before it starts running. Concurrent calls run
    /// their jobs concurrently.
    pub async fn start(&self, settings: JobSettings) -> Arc<Job> {
        let job = self.enqueue(settings);
        self.run(&job).await;
        job
    }

    /// Like [`start`](Self::start), on an image that is already available.
    pub async fn start_with_image(&self, settings: JobSettings, image: CapturedImage) -> Arc<Job> {
        let job = self.enqueue_with_image(settings, image);
        self.run(&job).await;
        job
    }

    /// Run a previously enqueued job to its terminal status.
    ///
    /// The completion is broadcast by the job itself, so it happens even if
    /// this future is dropped. A job that was already started is left alone
    /// and its current status returned.
    pub async fn run(&self, job: &Arc<Job>) -> JobStatus {
        match job.run().await {
            Some(status) => status,
            None => job.status(),
        }
    }

    /// Request a stop on every job that is currently running.
    ///
    /// Works on a snapshot, so jobs registered meanwhile are not blocked.
    /// Returns how many jobs were asked to stop.
    pub fn stop_all(&self) -> usize {
        let mut stopped = 0;
        for job in self.jobs() {
            if job.is_working() {
                // A job finishing in between makes this a no-op.
                job.request_stop();
                stopped += 1;
            }
        }
        if stopped > 0 {
            log::info!("Requested stop for {} running job(s)", stopped);
        }
        stopped
    }

    /// Receive each job once it reaches a terminal status.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Arc<Job>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Snapshot of all jobs in registration order.
    pub fn jobs(&self) -> Vec<Arc<Job>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: JobId) -> Option<Arc<Job>> {
        self.jobs().into_iter().find(|job| job.id() == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn broadcast(listeners: &Listeners, job: &Arc<Job>) {
    listeners
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .retain(|tx| tx.send(Arc::clone(job)).is_ok());
}
