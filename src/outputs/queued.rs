//! Asynchronous output backed by a bounded queue and a worker thread

use crate::core::{
    error::{LoggerError, Result},
    log::Log,
    metrics::QueueMetrics,
    output::{Output, QueueFullCallback},
};
use crossbeam_channel::{after, bounded, never, select, tick, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Interval at which [`QueuedOutput::wait_for_empty`] checks the queue
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Lifecycle of a [`QueuedOutput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QueueState {
    Open = 0,
    Closing = 1,
    Closed = 2,
}

impl QueueState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => QueueState::Open,
            1 => QueueState::Closing,
            _ => QueueState::Closed,
        }
    }
}

struct Shared {
    state: AtomicU8,
    blocking: AtomicBool,
    pending: AtomicUsize,
    on_queue_full: RwLock<Option<QueueFullCallback>>,
    metrics: QueueMetrics,
}

impl Shared {
    fn state(&self) -> QueueState {
        QueueState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn discard(&self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
        self.metrics.record_dropped();
    }
}

/// Output that hands logs to a worker thread through a bounded queue.
///
/// In blocking mode a full queue makes [`Output::log`] wait for space. In non-blocking
/// mode (the default) the log is dropped and the queue-full hook is called.
///
/// Logs offered once [`QueuedOutput::close`] has started are dropped. A `log` call that
/// was already enqueueing when close started finishes first, so everything accepted is
/// written before close returns.
///
/// # Example
///
/// ```
/// use logng::prelude::*;
/// use std::sync::Arc;
///
/// let text = Arc::new(TextOutput::new(std::io::sink(), TextOutputFlags::DEFAULT));
/// let queued = Arc::new(QueuedOutput::new(text, 1024));
/// let logger = Logger::new(queued.clone(), Severity::Info, 0);
///
/// logger.info("handled by the worker");
/// queued.close().unwrap();
/// ```
pub struct QueuedOutput {
    shared: Arc<Shared>,
    sender: RwLock<Option<Sender<Log>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl QueuedOutput {
    /// Starts the worker. A `queue_len` of 0 makes a rendezvous queue.
    pub fn new(output: Arc<dyn Output>, queue_len: usize) -> Self {
        let (sender, receiver) = bounded(queue_len);
        let shared = Arc::new(Shared {
            state: AtomicU8::new(QueueState::Open as u8),
            blocking: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
            on_queue_full: RwLock::new(None),
            metrics: QueueMetrics::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || Self::run(receiver, output, worker_shared));

        Self {
            shared,
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
        }
    }

    fn run(receiver: Receiver<Log>, output: Arc<dyn Output>, shared: Arc<Shared>) {
        for log in receiver.iter() {
            output.log(log);
            shared.metrics.record_processed();
            shared.pending.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Stops accepting logs, writes everything already queued and joins the worker.
    ///
    /// Only the first call does the work; later calls return `Ok(())` at once, even
    /// while the first is still draining.
    pub fn close(&self) -> Result<()> {
        if self
            .shared
            .state
            .compare_exchange(
                QueueState::Open as u8,
                QueueState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Ok(());
        }

        // Waits for producers still holding the read guard.
        drop(self.sender.write().take());

        let joined = match self.worker.lock().take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        };

        self.shared
            .state
            .store(QueueState::Closed as u8, Ordering::Release);

        joined.map_err(|payload| LoggerError::worker_panicked(payload.as_ref()))
    }

    pub fn state(&self) -> QueueState {
        self.shared.state()
    }

    /// Number of logs waiting in the queue
    pub fn len(&self) -> usize {
        self.sender.read().as_ref().map_or(0, Sender::len)
    }

    /// Whether no log is queued or being written
    pub fn is_empty(&self) -> bool {
        self.shared.pending.load(Ordering::Acquire) == 0
    }

    pub fn is_blocking(&self) -> bool {
        self.shared.blocking.load(Ordering::Relaxed)
    }

    /// Chooses between waiting for space and dropping when the queue is full.
    pub fn set_blocking(&self, blocking: bool) -> &Self {
        self.shared.blocking.store(blocking, Ordering::Relaxed);
        self
    }

    /// Sets the hook called each time a non-blocking `log` drops on a full queue.
    pub fn set_on_queue_full(&self, hook: Option<QueueFullCallback>) -> &Self {
        *self.shared.on_queue_full.write() = hook;
        self
    }

    pub fn metrics(&self) -> &QueueMetrics {
        &self.shared.metrics
    }

    /// Waits until no log is queued or being written.
    ///
    /// Fails with [`LoggerError::DeadlineExceeded`] once `timeout` has passed.
    pub fn wait_for_empty(&self, timeout: Duration) -> Result<()> {
        self.wait_for_empty_cancellable(&never(), timeout)
    }

    /// Like [`QueuedOutput::wait_for_empty`], and fails with [`LoggerError::Cancelled`]
    /// as soon as `cancel` receives a message or is disconnected.
    pub fn wait_for_empty_cancellable(&self, cancel: &Receiver<()>, timeout: Duration) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        let ticker = tick(WAIT_POLL_INTERVAL);
        let deadline = after(timeout);
        loop {
            select! {
                recv(ticker) -> _ => {
                    if self.is_empty() {
                        return Ok(());
                    }
                }
                recv(deadline) -> _ => return Err(LoggerError::DeadlineExceeded),
                recv(cancel) -> _ => return Err(LoggerError::Cancelled),
            }
        }
    }

    fn queue_full(&self) {
        self.shared.metrics.record_queue_full();
        let hook = self.shared.on_queue_full.read().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl Output for QueuedOutput {
    fn log(&self, log: Log) {
        if self.shared.state() != QueueState::Open {
            self.shared.metrics.record_dropped();
            return;
        }

        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            self.shared.metrics.record_dropped();
            return;
        };

        self.shared.pending.fetch_add(1, Ordering::AcqRel);
        let log = match sender.try_send(log) {
            Ok(()) => {
                self.shared.metrics.record_enqueued();
                return;
            }
            Err(TrySendError::Full(log)) => log,
            Err(TrySendError::Disconnected(_)) => {
                self.shared.discard();
                return;
            }
        };

        if self.is_blocking() {
            self.shared.metrics.record_block();
            match sender.send(log) {
                Ok(()) => {
                    self.shared.metrics.record_enqueued();
                }
                Err(_) => self.shared.discard(),
            }
            return;
        }

        self.shared.discard();
        drop(guard);
        self.queue_full();
    }
}

impl Drop for QueuedOutput {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close queued output: {}", e);
        }
    }
}
