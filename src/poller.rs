use crate::connection::Connection;
use crate::error::{FlapiError, Result};
use crate::handle::Handle;
use crate::models::status::{RenderLogItem, RenderStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cooperative cancellation for a polling loop. Clone it, hand one copy to
/// another thread (or a signal handler), and call cancel() there.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How the polling loop behaves. The interval is a lower bound on the gap
/// between status calls; the loop never busy-polls.
#[derive(Debug, Clone, Default)]
pub struct PollOptions {
    pub interval: Duration,
    /// Give up with Timeout after this much total wall time.
    pub deadline: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl PollOptions {
    pub fn with_interval(interval: Duration) -> Self {
        PollOptions {
            interval,
            ..Default::default()
        }
    }
}

/// Final state of a polled render: the terminal snapshot plus the processor
/// log, fetched once after the loop ends.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub status: RenderStatus,
    pub log: Vec<RenderLogItem>,
}

/// Drive a running render to completion. One status call per interval, with
/// a blocking sleep in between; cancellation and the deadline are checked
/// before each sleep so the loop exits without waiting out the server.
/// `progress` sees every non-terminal snapshot as it arrives.
pub fn wait_for_render(
    conn: &mut Connection,
    processor: &Handle,
    options: &PollOptions,
    mut progress: impl FnMut(&RenderStatus),
) -> Result<RenderOutcome> {
    let started = Instant::now();
    loop {
        let status = conn.render_progress(processor)?;
        if status.status.is_terminal() {
            debug!(status = ?status.status, "render reached terminal state");
            let log = conn.render_log(processor)?;
            return Ok(RenderOutcome { status, log });
        }
        progress(&status);

        if let Some(token) = &options.cancel {
            if token.is_cancelled() {
                return Err(FlapiError::Cancelled);
            }
        }
        if let Some(deadline) = options.deadline {
            if started.elapsed() + options.interval > deadline {
                return Err(FlapiError::Timeout);
            }
        }
        std::thread::sleep(options.interval);
    }
}
