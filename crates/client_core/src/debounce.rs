use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{sync::mpsc, task::JoinHandle};

pub struct Debouncer<T> {
    delay: Duration,
    slot: Arc<Mutex<Option<T>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    tx: mpsc::UnboundedSender<T>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                slot: Arc::new(Mutex::new(None)),
                timer: Mutex::new(None),
                tx,
            },
            rx,
        )
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn push(&self, value: T) {
        *lock(&self.slot) = Some(value);

        let mut timer = lock(&self.timer);
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        let slot = Arc::clone(&self.slot);
        let tx = self.tx.clone();
        let delay = self.delay;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let pending = lock(&slot).take();
            if let Some(value) = pending {
                let _ = tx.send(value);
            }
        }));
    }

    pub fn cancel(&self) {
        lock(&self.slot).take();
        if let Some(timer) = lock(&self.timer).take() {
            timer.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
