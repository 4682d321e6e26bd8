//! The single execution context where result callbacks run.
//!
//! # Design
//! Every outcome a `Resource` produces is funneled through one
//! `CompletionContext`, so callback code can touch caller state without
//! locking. `CompletionQueue` is the stock implementation: one named worker
//! thread running jobs in FIFO order. A UI host would instead implement the
//! trait by posting onto its own event loop.

use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, ThreadId};

/// A unit of work scheduled onto a completion context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait CompletionContext: Send + Sync {
    /// Schedule `job` to run later on this context. Must not run it inline.
    fn dispatch(&self, job: Job);
}

/// Serial queue backed by a dedicated thread.
///
/// Clones share the same thread. The thread exits once every handle has
/// been dropped and the queued jobs have run. A panicking job is logged and
/// does not take the queue down.
#[derive(Debug, Clone)]
pub struct CompletionQueue {
    sender: mpsc::Sender<Job>,
    thread: ThreadId,
}

impl CompletionQueue {
    pub fn new(name: &str) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for job in receiver {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!("completion job panicked");
                    }
                }
            })?;
        Ok(Self {
            sender,
            thread: handle.thread().id(),
        })
    }

    /// Whether the calling code is running on this queue's thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }
}

impl CompletionContext for CompletionQueue {
    fn dispatch(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::warn!("completion queue has shut down; dropping job");
        }
    }
}
