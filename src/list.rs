//! Newest-first list with tail eviction.

use std::collections::VecDeque;

/// Records that carry a server-assigned identity.
pub trait Keyed {
    fn key(&self) -> String;
}

/// Ordered, newest-first collection capped at `capacity` entries.
///
/// `push_front` evicts from the tail until the list fits again. `replace`
/// installs a server snapshot verbatim; the cap is re-established by the next
/// insertion, not by the snapshot itself.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedList<T> {
    items: VecDeque<T>,
    capacity: Option<usize>,
}

impl<T> BoundedList<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            items: VecDeque::new(),
            capacity: None,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Prepends `item` and returns whatever fell off the tail.
    pub fn push_front(&mut self, item: T) -> Vec<T> {
        self.items.push_front(item);
        let mut evicted = Vec::new();
        if let Some(cap) = self.capacity {
            while self.items.len() > cap {
                if let Some(tail) = self.items.pop_back() {
                    evicted.push(tail);
                }
            }
        }
        evicted
    }

    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items.into();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.iter().cloned().collect()
    }
}

impl<T: Keyed> BoundedList<T> {
    /// Removes every record with the given key. Returns how many were removed.
    pub fn remove_key(&mut self, key: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.key() != key);
        before - self.items.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }

    pub fn find(&self, key: &str) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }
}
