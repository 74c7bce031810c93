//! Output trait for log destinations

use super::error::LoggerError;
use super::log::Log;
use std::sync::Arc;

/// Destination of logs.
///
/// Implementations must be safe to call from many threads at once and must not block
/// the caller indefinitely, except where blocking is their documented contract
/// (a blocking [`QueuedOutput`](crate::outputs::QueuedOutput)).
pub trait Output: Send + Sync {
    fn log(&self, log: Log);
}

impl<T: Output + ?Sized> Output for Arc<T> {
    fn log(&self, log: Log) {
        (**self).log(log)
    }
}

impl<T: Output + ?Sized> Output for Box<T> {
    fn log(&self, log: Log) {
        (**self).log(log)
    }
}

/// Callback for errors that occur while formatting or writing a log
pub type ErrorCallback = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Callback invoked when a non-blocking queued output drops a log on a full queue
pub type QueueFullCallback = Arc<dyn Fn() + Send + Sync>;
