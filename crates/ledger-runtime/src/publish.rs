//! Snapshot publication between an aggregation pass and its readers.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// A list that is replaced wholesale, never edited in place.
///
/// Writers build the next list privately and swap it in under the write
/// lock; readers clone the current `Arc` under the read lock. Neither side
/// can observe a half-cleared or half-filled list.
#[derive(Debug)]
pub struct Published<T> {
    name: &'static str,
    current: RwLock<Arc<Vec<T>>>,
}

impl<T> Published<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            current: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Replace the published list, returning the previous snapshot.
    pub fn publish(&self, next: Vec<T>) -> Arc<Vec<T>> {
        self.publish_shared(Arc::new(next))
    }

    /// Swap in a list the caller keeps a handle to, returning the previous one.
    pub fn publish_shared(&self, next: Arc<Vec<T>>) -> Arc<Vec<T>> {
        let len = next.len();
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        info!(list = self.name, rows = len, "published");
        previous
    }

    /// Current snapshot; stays valid after later publishes.
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn publish_replaces_and_keeps_old_snapshots() {
        let list = Published::new("test");
        assert!(list.is_empty());
        list.publish(vec![1, 2, 3]);
        let before = list.snapshot();
        let previous = list.publish(vec![4]);
        assert_eq!(*previous, vec![1, 2, 3]);
        assert_eq!(*before, vec![1, 2, 3]);
        assert_eq!(*list.snapshot(), vec![4]);
    }

    #[test]
    fn readers_never_see_partial_lists() {
        let list = Arc::new(Published::new("test"));
        let writer = {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                for n in 1..200usize {
                    list.publish(vec![n; n]);
                }
            })
        };
        for _ in 0..500 {
            let snap = list.snapshot();
            if let Some(&n) = snap.first() {
                assert_eq!(snap.len(), n);
                assert!(snap.iter().all(|&v| v == n));
            }
        }
        writer.join().unwrap();
        assert_eq!(list.len(), 199);
    }
}
