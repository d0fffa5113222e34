use parking_lot::{FairMutex, Mutex, MutexGuard};

/// Per-stream lock with a fairness pre-lock.
///
/// Every acquisition goes through a fair pre-lock before the real lock and
/// drops it once the real lock is held. A stream I/O thread re-locking in a
/// tight loop therefore queues behind a control thread that is already
/// waiting, instead of winning the race on every release.
pub struct StreamLock<T> {
    pre: FairMutex<()>,
    inner: Mutex<T>,
}

impl<T> StreamLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            pre: FairMutex::new(()),
            inner: Mutex::new(value),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        let _pre = self.pre.lock();
        self.inner.lock()
    }
}
