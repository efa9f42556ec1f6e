//! Background Writer
//!
//! A single thread that applies queued mutations through the access layer,
//! off the caller's thread.
//!
//! ```text
//!   caller ──Job──▶ crossbeam channel ──▶ writer thread ──▶ EntryAccess
//!                                                │
//!                                                └──▶ ChangeNotifier (via access)
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};

use crate::access::EntryAccess;
use crate::config::SeedPolicy;
use crate::error::{Result, WordKvError};
use crate::model::Entry;

/// Work items for the writer thread
pub(crate) enum Job {
    /// Insert one validated entry
    Insert(Entry),
    /// Truncate the table
    DeleteAll,
    /// Apply a seed policy
    Seed(SeedPolicy),
    /// Reply once every earlier job has run, with the first error since the
    /// previous barrier
    Barrier(Sender<Result<()>>),
}

/// Handle to the writer thread
pub(crate) struct Writer {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl Writer {
    /// Spawn the writer thread
    pub(crate) fn spawn(access: Arc<dyn EntryAccess>) -> Result<Self> {
        let (sender, receiver) = channel::unbounded();

        let handle = thread::Builder::new()
            .name("wordkv-writer".to_string())
            .spawn(move || run(access, receiver))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue a job (fire-and-forget)
    pub(crate) fn submit(&self, job: Job) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(WordKvError::Closed)?;
        sender.send(job).map_err(|_| WordKvError::Closed)
    }

    /// Block until every job queued so far has been applied
    pub(crate) fn barrier(&self) -> Result<()> {
        let (reply, done) = channel::bounded(1);
        self.submit(Job::Barrier(reply))?;
        done.recv().map_err(|_| WordKvError::Closed)?
    }

    /// Let the queue drain, then stop and join the thread
    pub(crate) fn shutdown(&mut self) {
        // Dropping the sender ends the thread's receive loop once the queue
        // is empty.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Writer thread panicked");
            }
        }
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(access: Arc<dyn EntryAccess>, receiver: Receiver<Job>) {
    tracing::debug!("Writer thread started");
    let mut pending_error: Option<WordKvError> = None;

    for job in receiver {
        let outcome = match job {
            Job::Insert(entry) => access.insert(&entry).map(|_| ()),
            Job::DeleteAll => access.delete_all().map(|_| ()),
            Job::Seed(policy) => seed(access.as_ref(), &policy),
            Job::Barrier(reply) => {
                let result = pending_error.take().map_or(Ok(()), Err);
                let _ = reply.send(result);
                continue;
            }
        };

        if let Err(e) = outcome {
            tracing::error!(error = %e, "Background write failed");
            pending_error.get_or_insert(e);
        }
    }

    tracing::debug!("Writer thread stopped");
}

/// Apply a seed policy through the access layer
pub(crate) fn seed(access: &dyn EntryAccess, policy: &SeedPolicy) -> Result<()> {
    let words = match policy {
        SeedPolicy::None => return Ok(()),
        SeedPolicy::IfEmpty(words) => {
            if !access.list_ordered()?.is_empty() {
                tracing::debug!("Table not empty, seeding skipped");
                return Ok(());
            }
            words
        }
        SeedPolicy::ResetOnOpen(words) => {
            access.delete_all()?;
            words
        }
    };

    for word in words {
        access.insert_key(word)?;
    }
    tracing::info!(words = words.len(), "Seeded table");
    Ok(())
}
