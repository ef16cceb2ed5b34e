use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use crate::error::TelemetryError;

/// Queue of pending items. Pushing never blocks on I/O, so it can be used from synchronous
/// `track_*` calls.
pub struct Buffer<T> {
    max_size: usize,
    queue: Mutex<VecDeque<T>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AddStatus<T> {
    /// The buffer reached `max_size`. Everything it held is handed back and the queue is empty.
    Full { drained: Vec<T> },
    Ok,
}

impl<T> Buffer<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            max_size: max_size.max(1),
        }
    }

    fn lock_queue(&self) -> Result<MutexGuard<'_, VecDeque<T>>, TelemetryError> {
        self.queue
            .lock()
            .map_err(|e| TelemetryError::Lock(e.to_string()))
    }

    pub fn add(&self, item: T) -> Result<AddStatus<T>, TelemetryError> {
        let mut queue = self.lock_queue()?;
        queue.push_back(item);
        if queue.len() >= self.max_size {
            Ok(AddStatus::Full {
                drained: queue.drain(..).collect(),
            })
        } else {
            Ok(AddStatus::Ok)
        }
    }

    /// Puts items taken by `add` back in front of anything queued since.
    pub fn requeue(&self, items: Vec<T>) -> Result<(), TelemetryError> {
        let mut queue = self.lock_queue()?;
        for item in items.into_iter().rev() {
            queue.push_front(item);
        }
        Ok(())
    }

    pub fn drain(&self) -> Result<Vec<T>, TelemetryError> {
        let mut queue = self.lock_queue()?;
        Ok(queue.drain(..).collect())
    }

    pub fn len(&self) -> Result<usize, TelemetryError> {
        Ok(self.lock_queue()?.len())
    }
}
