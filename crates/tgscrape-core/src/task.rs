//! Background harvest task with progress channel, cancellation and join
//!
//! Lets an interactive front end keep its own thread responsive: the
//! harvester runs on a dedicated thread, progress arrives over a channel,
//! and `cancel` takes effect at the next item boundary.

use std::io;
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;

use chrono::NaiveDate;

use crate::batch::ResultBatch;
use crate::cancel::CancelFlag;
use crate::clock::Clock;
use crate::harvester::{HarvestError, Harvester};
use crate::model::PostRecord;
use crate::source::PostSource;
use crate::window::QueryWindow;

/// Progress event sent once per accepted post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Accepted {
        count: usize,
        post_id: String,
        date: NaiveDate,
    },
}

impl Progress {
    fn accepted(count: usize, record: &PostRecord) -> Self {
        Self::Accepted {
            count,
            post_id: record.post_id().to_string(),
            date: record.date(),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::Accepted { count, .. } => *count,
        }
    }
}

type TaskResult = Result<ResultBatch, HarvestError>;

/// Handle to a harvest running on its own thread.
///
/// Dropping the handle cancels the harvest and waits for the thread to stop.
#[derive(Debug)]
pub struct HarvestTask {
    cancel: CancelFlag,
    progress: Receiver<Progress>,
    handle: Option<JoinHandle<TaskResult>>,
}

impl HarvestTask {
    /// Start `harvester` over `source` on a new thread.
    pub fn spawn<S, C>(source: S, window: QueryWindow, harvester: Harvester<C>) -> io::Result<Self>
    where
        S: PostSource + Send + 'static,
        C: Clock + 'static,
    {
        let cancel = harvester.cancel_flag();
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name(format!("harvest-{}", window.channel()))
            .spawn(move || {
                let mut observer = |count: usize, record: &PostRecord| {
                    // Receiver may be gone if the front end stopped listening
                    let _ = tx.send(Progress::accepted(count, record));
                };
                harvester.run(&source, &window, &mut observer)
            })?;
        Ok(Self {
            cancel,
            progress: rx,
            handle: Some(handle),
        })
    }

    /// Progress events; iteration ends once the harvest thread exits.
    pub fn progress(&self) -> &Receiver<Progress> {
        &self.progress
    }

    /// Request cancellation; takes effect before the next source pull.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the harvester to stop and return its batch
    pub fn join(mut self) -> TaskResult {
        self.wait()
    }

    /// Cancel, then wait for acknowledgment that the harvester stopped
    pub fn cancel_and_join(self) -> TaskResult {
        self.cancel();
        self.join()
    }

    fn wait(&mut self) -> TaskResult {
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(Err(HarvestError::Panicked)),
            None => Err(HarvestError::Panicked),
        }
    }
}

impl Drop for HarvestTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
            let _ = self.wait();
        }
    }
}
