//! Awaitable handle for work running on the rayon pool.
//!
//! The task owns a cancellation flag. Dropping the handle or calling
//! [`Task::cancel`] sets it; scans observe it at their next checkpoint.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

struct Slot<T> {
    value: Option<T>,
    waker: Option<Waker>,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A unit of work whose result is delivered through `.await`
#[must_use = "a task is cancelled when dropped"]
pub struct Task<T> {
    shared: Arc<Shared<T>>,
    cancel: Arc<AtomicBool>,
}

impl<T: Send + 'static> Task<T> {
    /// Run `work` on the rayon pool; it receives the task's cancellation flag
    pub(crate) fn spawn<F>(work: F) -> Self
    where
        F: FnOnce(&AtomicBool) -> T + Send + 'static,
    {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                value: None,
                waker: None,
            }),
        });
        let cancel = Arc::new(AtomicBool::new(false));
        let (worker_shared, worker_cancel) = (shared.clone(), cancel.clone());
        rayon::spawn(move || {
            let value = work(&worker_cancel);
            let waker = {
                let mut slot = worker_shared.lock();
                slot.value = Some(value);
                slot.waker.take()
            };
            if let Some(waker) = waker {
                waker.wake();
            }
        });
        Self { shared, cancel }
    }
}

impl<T> Task<T> {
    /// Ask the running work to stop at its next checkpoint
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Whether the result is ready to be taken without waiting
    pub fn is_finished(&self) -> bool {
        self.shared.lock().value.is_some()
    }
}

impl<T> Future for Task<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut slot = self.shared.lock();
        match slot.value.take() {
            Some(value) => Poll::Ready(value),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Minimal executor for tests: parks the thread until the future is woken
#[cfg(test)]
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    use std::task::Wake;
    use std::thread::{self, Thread};

    struct Unpark(Thread);

    impl Wake for Unpark {
        fn wake(self: Arc<Self>) {
            self.0.unpark();
        }
    }

    let waker = Waker::from(Arc::new(Unpark(thread::current())));
    let mut cx = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);
    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(value) => return value,
            Poll::Pending => thread::park(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_delivers_result() {
        let task = Task::spawn(|_| 6 * 7);
        assert_eq!(block_on(task), 42);
    }

    #[test]
    fn test_drop_sets_cancel_flag() {
        let (started_tx, started_rx) = mpsc::channel();
        let (seen_tx, seen_rx) = mpsc::channel();
        let task = Task::spawn(move |cancel| {
            started_tx.send(()).unwrap();
            while !cancel.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(1));
            }
            seen_tx.send(()).unwrap();
        });
        started_rx.recv().unwrap();
        drop(task);
        assert!(seen_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_cancel_is_visible_to_work() {
        let task = Task::spawn(|cancel| {
            while !cancel.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(1));
            }
            "stopped"
        });
        task.cancel();
        assert_eq!(block_on(task), "stopped");
    }
}
