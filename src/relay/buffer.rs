//! Fixed-capacity history that overwrites its oldest entry
//!
//! Both the inbound chat history and the bot's own reply history are kept in
//! a `RotatingBuffer`. Entries are stored oldest first.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RotatingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RotatingBuffer<T> {
    /// Create an empty buffer; a capacity of 0 is treated as 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `value`, evicting the oldest entry when full
    pub fn insert(&mut self, value: T) {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<'a, T> IntoIterator for &'a RotatingBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
