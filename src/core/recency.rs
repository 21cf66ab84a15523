/// Recency window — bounded FIFO used for anti-repetition tracking.
use std::collections::VecDeque;

/// Keeps at most `capacity` of the most recently pushed items,
/// evicting the oldest first.
#[derive(Debug, Clone)]
pub struct RecencyWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: PartialEq> RecencyWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push an item, evicting from the front until the window fits again.
    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
