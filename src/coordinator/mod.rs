// src/coordinator/mod.rs

//! Multi-producer, single-consumer search coordinator
//!
//! A search fans out one producer task per repository URL. Every producer
//! pushes batches of results and errors into two queues drained by a single
//! consumer task that is running before the first producer is spawned.
//!
//! Shutdown happens in a fixed order in [`SearchCoordinator::wait_and_close`]:
//!
//! 1. join every producer (a panic counts as completion and is recorded)
//! 2. drop the owner's senders, closing both queues
//! 3. wait for the consumer to hand back the [`Aggregate`]
//!
//! Coordinators compose: a producer may own its own coordinator and
//! [`Aggregate::forward`] the nested result to its parent before returning.
//! One producer's failure never cancels its siblings.

use crate::error::{Error, Result};
use crate::progress::{ProgressTracker, SilentProgress};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Lifecycle of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Queues allocated and consumer running, no producer yet
    Created,
    /// At least one producer registered
    Running,
    /// Waiting for producers and the consumer
    Draining,
    /// Aggregate handed out
    Closed,
}

/// Everything the consumer collected
#[derive(Debug)]
pub struct Aggregate<T> {
    pub items: Vec<T>,
    pub errors: Vec<Error>,
    /// Producers that completed, including skipped ones
    pub producers: usize,
    /// Producers that reported at least one error or panicked
    pub failed: usize,
}

impl<T> Aggregate<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            errors: Vec::new(),
            producers: 0,
            failed: 0,
        }
    }

    /// Every producer that ran failed
    pub fn all_failed(&self) -> bool {
        self.failed > 0 && self.failed == self.producers
    }

    /// `PartialFailure` when some, but not all, producers failed
    pub fn partial_failure(&self) -> Option<Error> {
        if self.failed > 0 && self.failed < self.producers {
            Some(Error::PartialFailure {
                failed: self.failed,
                total: self.producers,
            })
        } else {
            None
        }
    }

    /// Hand the nested items to a parent producer as one batch, then its errors
    pub fn forward(self, parent: &Producer<T>) {
        parent.send(self.items);
        for error in self.errors {
            parent.send_error(error);
        }
    }
}

/// Sending half handed to each producer task
pub struct Producer<T> {
    results: mpsc::UnboundedSender<Vec<T>>,
    errors: mpsc::UnboundedSender<Error>,
    failed: Arc<AtomicBool>,
}

impl<T> Producer<T> {
    /// Push a batch of results; empty batches are dropped
    pub fn send(&self, batch: Vec<T>) {
        if batch.is_empty() {
            return;
        }
        if self.results.send(batch).is_err() {
            debug!("Result queue closed, dropping batch");
        }
    }

    /// Record a failure for this producer
    pub fn send_error(&self, error: Error) {
        self.failed.store(true, Ordering::Relaxed);
        if let Err(e) = self.errors.send(error) {
            debug!("Error queue closed, dropping error: {}", e.0);
        }
    }
}

/// Coordinates a bounded set of producers and one consumer
pub struct SearchCoordinator<T: Send + 'static> {
    expected: usize,
    registered: usize,
    skipped: usize,
    state: State,
    tasks: JoinSet<bool>,
    results: Option<mpsc::UnboundedSender<Vec<T>>>,
    errors: Option<mpsc::UnboundedSender<Error>>,
    done: Option<oneshot::Receiver<(Vec<T>, Vec<Error>)>>,
    progress: Arc<dyn ProgressTracker>,
}

impl<T: Send + 'static> SearchCoordinator<T> {
    /// Allocate the queues and start the consumer
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(expected: usize, progress: Arc<dyn ProgressTracker>) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(consume(results_rx, errors_rx, done_tx));
        progress.start(expected as u64);

        Self {
            expected,
            registered: 0,
            skipped: 0,
            state: State::Created,
            tasks: JoinSet::new(),
            results: Some(results_tx),
            errors: Some(errors_tx),
            done: Some(done_rx),
            progress,
        }
    }

    /// Coordinator without progress reporting
    pub fn silent(expected: usize) -> Self {
        Self::new(expected, Arc::new(SilentProgress::new()))
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    fn check_capacity(&self) -> Result<()> {
        if !matches!(self.state, State::Created | State::Running) {
            return Err(Error::CoordinatorError(format!(
                "cannot register producers while {:?}",
                self.state
            )));
        }
        if self.registered + self.skipped >= self.expected {
            return Err(Error::CoordinatorError(format!(
                "more than {} producers registered",
                self.expected
            )));
        }
        Ok(())
    }

    fn senders(&self) -> Result<(mpsc::UnboundedSender<Vec<T>>, mpsc::UnboundedSender<Error>)> {
        match (&self.results, &self.errors) {
            (Some(results), Some(errors)) => Ok((results.clone(), errors.clone())),
            _ => Err(Error::CoordinatorError("queues already closed".to_string())),
        }
    }

    /// Register and start a producer task
    ///
    /// An `Err` returned by the task is recorded like [`Producer::send_error`].
    pub fn spawn<F, Fut>(&mut self, work: F) -> Result<()>
    where
        F: FnOnce(Producer<T>) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.check_capacity()?;
        let (results, errors) = self.senders()?;

        let failed = Arc::new(AtomicBool::new(false));
        let producer = Producer {
            results,
            errors: errors.clone(),
            failed: Arc::clone(&failed),
        };
        let fut = work(producer);

        self.tasks.spawn(async move {
            if let Err(e) = fut.await {
                failed.store(true, Ordering::Relaxed);
                let _ = errors.send(e);
            }
            failed.load(Ordering::Relaxed)
        });

        self.registered += 1;
        self.state = State::Running;
        Ok(())
    }

    /// Account for an expected producer that will not run
    pub fn skip(&mut self) -> Result<()> {
        self.check_capacity()?;
        self.skipped += 1;
        self.progress.producer_done();
        Ok(())
    }

    /// Join all producers, close the queues, then collect the consumer's result
    pub async fn wait_and_close(&mut self) -> Result<Aggregate<T>> {
        if self.state == State::Closed || self.state == State::Draining {
            return Err(Error::CoordinatorError(
                "coordinator already closed".to_string(),
            ));
        }
        self.state = State::Draining;

        if self.registered + self.skipped < self.expected {
            warn!(
                "Expected {} producers but only {} were registered",
                self.expected,
                self.registered + self.skipped
            );
        }

        let mut failed = 0;
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(true) => failed += 1,
                Ok(false) => {}
                Err(e) => {
                    failed += 1;
                    if let Some(errors) = &self.errors {
                        let _ = errors.send(Error::CoordinatorError(format!(
                            "producer task failed: {e}"
                        )));
                    }
                }
            }
            self.progress.producer_done();
        }

        self.results.take();
        self.errors.take();

        let done = self
            .done
            .take()
            .ok_or_else(|| Error::CoordinatorError("consumer already collected".to_string()))?;
        let (items, errors) = done
            .await
            .map_err(|_| Error::CoordinatorError("consumer exited early".to_string()))?;

        self.state = State::Closed;
        let mut aggregate = Aggregate::empty();
        aggregate.items = items;
        aggregate.errors = errors;
        aggregate.producers = self.registered + self.skipped;
        aggregate.failed = failed;
        Ok(aggregate)
    }
}

/// Drain both queues until they are closed
async fn consume<T>(
    mut results: mpsc::UnboundedReceiver<Vec<T>>,
    mut errors: mpsc::UnboundedReceiver<Error>,
    done: oneshot::Sender<(Vec<T>, Vec<Error>)>,
) {
    let mut items = Vec::new();
    let mut failures = Vec::new();
    let mut results_open = true;
    let mut errors_open = true;

    while results_open || errors_open {
        tokio::select! {
            batch = results.recv(), if results_open => match batch {
                Some(batch) => items.extend(batch),
                None => results_open = false,
            },
            error = errors.recv(), if errors_open => match error {
                Some(error) => {
                    warn!("Search error: {}", error);
                    failures.push(error);
                }
                None => errors_open = false,
            },
        }
    }

    if done.send((items, failures)).is_err() {
        debug!("Coordinator dropped before consumer finished");
    }
}
