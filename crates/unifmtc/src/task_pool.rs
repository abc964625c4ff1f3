//! Formatter worker threads shared by every batch request in the process.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;

use unifmt_rt::error::RtError;

use crate::batch::FileOutcome;
use crate::options::FormatOptions;

pub(crate) type FormatFn = fn(&Path, &FormatOptions) -> Result<FileOutcome, RtError>;

/// Result for the file at `.0` in the caller's input order.
pub(crate) type Reply = (usize, Result<FileOutcome, RtError>);

pub(crate) struct FormatJob {
    pub idx: usize,
    pub path: PathBuf,
    pub opts: FormatOptions,
    pub format: FormatFn,
    pub reply: Sender<Reply>,
}

impl FormatJob {
    /// Formats the file and answers on `reply`. A panic inside the formatter
    /// becomes an error for this file only.
    fn run(self) {
        let format = self.format;
        let result = panic::catch_unwind(AssertUnwindSafe(|| format(&self.path, &self.opts)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                log::warn!("formatter panicked on {}: {message}", self.path.display());
                Err(RtError::io(
                    &self.path,
                    io::Error::other(format!("formatter panicked: {message}")),
                ))
            });
        let _ = self.reply.send((self.idx, result));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        return (*text).to_string();
    }
    if let Some(text) = payload.downcast_ref::<String>() {
        return text.clone();
    }
    "unknown panic".to_string()
}

pub(crate) fn submit(job: FormatJob) {
    TaskPool::global().submit(job);
}

/// Number of worker threads that actually started.
pub(crate) fn worker_count() -> usize {
    TaskPool::global().workers
}

struct TaskPool {
    tx: Sender<FormatJob>,
    workers: usize,
}

impl TaskPool {
    fn global() -> &'static Self {
        static POOL: OnceLock<TaskPool> = OnceLock::new();
        POOL.get_or_init(Self::new)
    }

    fn new() -> Self {
        let (tx, rx) = mpsc::channel::<FormatJob>();
        let wanted = thread::available_parallelism()
            .map(|n| n.get().max(2))
            .unwrap_or(2);
        let shared_rx: Arc<Mutex<Receiver<FormatJob>>> = Arc::new(Mutex::new(rx));
        let mut workers = 0;
        for idx in 0..wanted {
            let worker_rx = Arc::clone(&shared_rx);
            let name = format!("unifmt-fmt-{idx}");
            let spawned = thread::Builder::new().name(name).spawn(move || {
                loop {
                    let job = {
                        let guard = match worker_rx.lock() {
                            Ok(guard) => guard,
                            Err(_) => break,
                        };
                        match guard.recv() {
                            Ok(job) => job,
                            Err(_) => break,
                        }
                    };
                    job.run();
                }
            });
            match spawned {
                Ok(_) => workers += 1,
                Err(err) => log::warn!("failed to start formatter worker {idx}: {err}"),
            }
        }
        Self { tx, workers }
    }

    fn submit(&self, job: FormatJob) {
        // with no live worker the receiver is gone and the job runs here
        if let Err(mpsc::SendError(job)) = self.tx.send(job) {
            job.run();
        }
    }
}
