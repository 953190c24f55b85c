//! Frame Sources
//!
//! A [`FrameSource`] is the host's "run this at the next render" primitive,
//! the equivalent of `requestAnimationFrame`. Each request is single-shot:
//! the callback runs once, and there is no way to cancel it.
//!
//! Two sources ship with the crate:
//!
//! - [`ManualFrames`]: frames happen when the host calls
//!   [`advance`](ManualFrames::advance). Use it from tests or to embed the
//!   binder in a render loop you already own.
//!
//! - [`TokioFrames`]: frames happen on a timer on a tokio runtime, emulating
//!   a fixed display refresh rate.

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::config::BinderConfig;
use crate::error::{BinderError, Result};

/// Callback run at the next frame.
pub type FrameCallback = Box<dyn FnOnce() + Send + 'static>;

/// Schedules a callback for the next rendering opportunity.
pub trait FrameSource: Send + Sync {
    fn request_frame(&self, callback: FrameCallback);
}

/// Host-driven frame source.
///
/// Requests queue up until [`advance`](Self::advance) runs them.
#[derive(Default)]
pub struct ManualFrames {
    queue: Mutex<Vec<FrameCallback>>,
}

impl ManualFrames {
    /// Create a new frame source with nothing queued.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Run one frame.
    ///
    /// Only callbacks queued before this call run; anything they request
    /// waits for the next `advance`. Returns the number of callbacks run.
    pub fn advance(&self) -> usize {
        let due = mem::take(&mut *self.queue.lock());
        let count = due.len();
        for callback in due {
            callback();
        }
        count
    }

    /// Run `frames` frames in a row. Returns the total number of callbacks run.
    pub fn advance_by(&self, frames: usize) -> usize {
        (0..frames).map(|_| self.advance()).sum()
    }

    /// Get the number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl FrameSource for ManualFrames {
    fn request_frame(&self, callback: FrameCallback) {
        self.queue.lock().push(callback);
    }
}

impl fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualFrames")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Timer-driven frame source on a tokio runtime.
///
/// Each request spawns a task that sleeps for one frame interval and then
/// runs the callback on the runtime.
#[derive(Debug, Clone)]
pub struct TokioFrames {
    handle: Handle,
    interval: Duration,
}

impl TokioFrames {
    /// Create a frame source on the current tokio runtime.
    ///
    /// Returns [`BinderError::NoRuntime`] when called outside a runtime.
    pub fn new(interval: Duration) -> Result<Arc<Self>> {
        let handle = Handle::try_current().map_err(|_| BinderError::NoRuntime)?;
        Ok(Self::with_handle(handle, interval))
    }

    /// Create a frame source on the current tokio runtime, ticking at the
    /// configured [`frame_interval`](BinderConfig::frame_interval).
    pub fn from_config(config: &BinderConfig) -> Result<Arc<Self>> {
        Self::new(config.frame_interval)
    }

    /// Create a frame source on an explicit runtime.
    pub fn with_handle(handle: Handle, interval: Duration) -> Arc<Self> {
        Arc::new(Self { handle, interval })
    }

    /// Get the delay between frames.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameSource for TokioFrames {
    fn request_frame(&self, callback: FrameCallback) {
        let interval = self.interval;
        self.handle.spawn(async move {
            tokio::time::sleep(interval).await;
            callback();
        });
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn manual_frames_run_queued_callbacks_once() {
        let frames = ManualFrames::new();
        let count = Arc::new(AtomicI32::new(0));

        for _ in 0..3 {
            let count = count.clone();
            frames.request_frame(Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(frames.pending(), 3);
        assert_eq!(frames.advance(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);

        // Nothing left
        assert_eq!(frames.advance(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn requests_made_during_a_frame_wait_for_the_next() {
        let frames = ManualFrames::new();
        let count = Arc::new(AtomicI32::new(0));

        let frames_clone = frames.clone();
        let count_clone = count.clone();
        frames.request_frame(Box::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
            let count = count_clone.clone();
            frames_clone.request_frame(Box::new(move || {
                count.fetch_add(10, Ordering::SeqCst);
            }));
        }));

        assert_eq!(frames.advance(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(frames.pending(), 1);

        assert_eq!(frames.advance(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn tokio_frames_require_a_runtime() {
        let err = TokioFrames::new(Duration::from_millis(16)).unwrap_err();
        assert_eq!(err, BinderError::NoRuntime);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_frames_use_configured_interval() {
        let config = BinderConfig {
            frame_interval: Duration::from_secs(3600),
            ..Default::default()
        };
        let frames = TokioFrames::from_config(&config).unwrap();
        assert_eq!(frames.interval(), Duration::from_secs(3600));

        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        frames.request_frame(Box::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_frames_fire_after_interval() {
        let frames = TokioFrames::new(Duration::from_millis(16)).unwrap();
        let count = Arc::new(AtomicI32::new(0));

        let count_clone = count.clone();
        frames.request_frame(Box::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(8)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(16)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
