//! LRU Tracker Module
//!
//! Implements recency tracking used for cache eviction.

use std::collections::HashMap;

#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Tracker ==
/// Tracks key order for eviction.
///
/// Keys live in an arena-backed doubly linked list where:
/// - Front (head) = Most recently touched
/// - Back (tail) = Least recently touched
///
/// Every operation is O(1). A key that is touched only when first inserted
/// yields insertion order, which is how the bounded TTL cache uses it.
#[derive(Debug, Default)]
pub struct LruTracker {
    index: HashMap<String, usize>,
    nodes: Vec<Node>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    ///
    /// If key exists, unlinks it first then adds to front.
    /// If key is new, just adds to front.
    pub fn touch(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&idx) => {
                if self.head != Some(idx) {
                    self.unlink(idx);
                    self.push_front(idx);
                }
            }
            None => {
                let idx = self.alloc(key.to_string());
                self.index.insert(key.to_string(), idx);
                self.push_front(idx);
            }
        }
    }

    // == Remove ==
    /// Removes a key from the tracker. Returns false if it was not tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(idx) => {
                self.unlink(idx);
                self.release(idx);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let idx = self.tail?;
        self.unlink(idx);
        let key = std::mem::take(&mut self.nodes[idx].key);
        self.index.remove(&key);
        self.free.push(idx);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&str> {
        self.tail.map(|idx| self.nodes[idx].key.as_str())
    }

    /// Iterates keys from most to least recently touched.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::successors(self.head, move |&idx| self.nodes[idx].next)
            .map(move |idx| self.nodes[idx].key.as_str())
    }

    /// Forgets every key.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    fn alloc(&mut self, key: String) -> usize {
        let node = Node {
            key,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) {
        self.nodes[idx].key.clear();
        self.free.push(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev.take();
        let next = self.nodes[idx].next.take();

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;

        if let Some(old_head) = self.head {
            self.nodes[old_head].prev = Some(idx);
        }
        self.head = Some(idx);

        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}
