use crate::pipeline::types::LatentVector;
use std::collections::VecDeque;

/// Bounded FIFO of the most recent latent vectors.
#[derive(Debug, Clone)]
pub struct SequenceWindow {
    items: VecDeque<LatentVector>,
    capacity: usize,
}

impl SequenceWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends at the tail, evicting the head once over capacity.
    pub fn push(&mut self, latent: LatentVector) {
        self.items.push_back(latent);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
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

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Oldest to newest.
    pub fn to_sequence(&self) -> Vec<LatentVector> {
        self.items.iter().cloned().collect()
    }
}
