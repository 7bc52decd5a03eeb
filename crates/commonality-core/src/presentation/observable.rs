//! Observable list.
//!
//! A `Vec` that tells subscribers how it changed. Range operations report
//! a single [`CollectionChange::Reset`] instead of one change per item, so
//! a view re-renders once per batch.

use std::ops::Deref;

use tokio::sync::broadcast;

use crate::error::{CoreError, CoreResult};

const CHANNEL_CAPACITY: usize = 64;

/// How the list changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange<T> {
    Added { index: usize, item: T },
    Removed { index: usize, item: T },
    /// Changed wholesale; re-read the list
    Reset,
}

/// List that broadcasts every change.
pub struct ObservableVec<T> {
    items: Vec<T>,
    changes: broadcast::Sender<CollectionChange<T>>,
}

impl<T: Clone> ObservableVec<T> {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            items: Vec::new(),
            changes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange<T>> {
        self.changes.subscribe()
    }

    pub fn push(&mut self, item: T) {
        let index = self.items.len();
        self.items.push(item.clone());
        self.notify(CollectionChange::Added { index, item });
    }

    pub fn insert(&mut self, index: usize, item: T) -> CoreResult<()> {
        self.check_insert(index)?;
        self.items.insert(index, item.clone());
        self.notify(CollectionChange::Added { index, item });
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> CoreResult<T> {
        if index >= self.items.len() {
            return Err(CoreError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let item = self.items.remove(index);
        self.notify(CollectionChange::Removed {
            index,
            item: item.clone(),
        });
        Ok(item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.notify(CollectionChange::Reset);
    }

    /// Append every item, then notify once.
    pub fn extend_range(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
        self.notify(CollectionChange::Reset);
    }

    /// Insert every item starting at `index`, then notify once.
    pub fn insert_range(&mut self, index: usize, items: impl IntoIterator<Item = T>) -> CoreResult<()> {
        self.check_insert(index)?;
        let _ = self.items.splice(index..index, items);
        self.notify(CollectionChange::Reset);
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn check_insert(&self, index: usize) -> CoreResult<()> {
        if index > self.items.len() {
            return Err(CoreError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(())
    }

    fn notify(&self, change: CollectionChange<T>) {
        let _ = self.changes.send(change);
    }
}

impl<T: Clone> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for ObservableVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn drain<T: Clone>(rx: &mut broadcast::Receiver<CollectionChange<T>>) -> Vec<CollectionChange<T>> {
        let mut changes = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(change) => changes.push(change),
                Err(TryRecvError::Empty) => return changes,
                Err(e) => panic!("unexpected receive error: {:?}", e),
            }
        }
    }

    #[test]
    fn test_single_item_changes() {
        let mut list = ObservableVec::new();
        let mut rx = list.subscribe();

        list.push("a");
        list.insert(0, "b").unwrap();
        assert_eq!(list.remove(1).unwrap(), "a");

        assert_eq!(&*list, &["b"]);
        assert_eq!(
            drain(&mut rx),
            vec![
                CollectionChange::Added { index: 0, item: "a" },
                CollectionChange::Added { index: 0, item: "b" },
                CollectionChange::Removed { index: 1, item: "a" },
            ]
        );
    }

    #[test]
    fn test_extend_range_notifies_once() {
        let mut list = ObservableVec::new();
        let mut rx = list.subscribe();

        list.extend_range(1..=100);

        assert_eq!(list.len(), 100);
        assert_eq!(drain(&mut rx), vec![CollectionChange::Reset]);
    }

    #[test]
    fn test_insert_range() {
        let mut list = ObservableVec::new();
        list.extend_range([1, 2, 5]);
        let mut rx = list.subscribe();

        list.insert_range(2, [3, 4]).unwrap();

        assert_eq!(list.as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(drain(&mut rx), vec![CollectionChange::Reset]);
    }

    #[test]
    fn test_insert_range_out_of_range() {
        let mut list = ObservableVec::new();
        list.push(1);
        let mut rx = list.subscribe();

        let err = list.insert_range(5, [2, 3]).unwrap_err();

        assert!(matches!(err, CoreError::IndexOutOfRange { index: 5, len: 1 }));
        assert_eq!(list.as_slice(), &[1]);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut list: ObservableVec<u8> = ObservableVec::new();
        assert!(list.remove(0).is_err());
    }

    #[test]
    fn test_clear() {
        let mut list = ObservableVec::new();
        list.extend_range(["x", "y"]);
        let mut rx = list.subscribe();

        list.clear();

        assert!(list.is_empty());
        assert_eq!(drain(&mut rx), vec![CollectionChange::Reset]);
    }
}
