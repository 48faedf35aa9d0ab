//! Cancelable idle timer
//!
//! Each `arm` restarts the countdown; only the most recent arm fires. When
//! the timer fires, the callback runs as its own task, so cancelling or
//! re-arming afterwards never interrupts work the callback already started.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct Debouncer {
    delay: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timer: Mutex::new(None),
        }
    }

    /// Start (or restart) the countdown. `fire` runs once the delay elapses
    /// without another `arm` or `cancel`.
    ///
    /// Returns `false` when called outside a tokio runtime; nothing is
    /// scheduled then.
    pub fn arm<F, Fut>(&self, fire: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available, debounced work not scheduled");
            return false;
        };

        let delay = self.delay;
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(fire());
        });

        let previous = self
            .timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
        debug!("Debounce timer armed for {:?}", delay);
        true
    }

    /// Stop a pending countdown. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let timer = self
            .timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match timer {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                debug!("Debounce timer cancelled");
                true
            }
            _ => false,
        }
    }

    /// Whether a countdown is running
    pub fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
