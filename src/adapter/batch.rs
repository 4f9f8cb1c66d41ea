//! Bounded batch queue.

use crate::types::{CompleteOptions, Prompt};

#[derive(Debug, Clone)]
pub(super) struct QueuedRequest {
    pub prompt: Prompt,
    pub options: CompleteOptions,
}

/// Append-only queue drained whole. Every item leaves through exactly one
/// drain.
#[derive(Debug, Default)]
pub(super) struct BatchQueue {
    items: Vec<QueuedRequest>,
}

impl BatchQueue {
    /// Append `item`; once the queue holds `max_batch_size` items they are
    /// drained and returned.
    pub fn push(&mut self, item: QueuedRequest, max_batch_size: usize) -> Option<Vec<QueuedRequest>> {
        self.items.push(item);
        (self.items.len() >= max_batch_size.max(1)).then(|| self.drain())
    }

    pub fn drain(&mut self) -> Vec<QueuedRequest> {
        std::mem::take(&mut self.items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str) -> QueuedRequest {
        QueuedRequest {
            prompt: text.into(),
            options: CompleteOptions::new(),
        }
    }

    #[test]
    fn drains_exactly_at_threshold() {
        let mut queue = BatchQueue::default();
        assert!(queue.push(item("a"), 2).is_none());
        let batch = queue.push(item("b"), 2).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.len(), 0);
        assert!(queue.push(item("c"), 2).is_none());
        assert_eq!(queue.drain().len(), 1);
        assert!(queue.drain().is_empty());
    }
}
