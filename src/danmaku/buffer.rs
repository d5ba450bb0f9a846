use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 200;

/// FIFO buffer that evicts its oldest entries once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `item` and returns the entry evicted to make room, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
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

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> BoundedBuffer<T> {
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl<T> Default for BoundedBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_keeps_last_200_of_250() {
        let mut buffer = BoundedBuffer::default();
        for i in 0..250 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), 200);
        assert_eq!(buffer.snapshot(), (50..250).collect::<Vec<_>>());
    }

    #[test]
    fn test_push_reports_eviction() {
        let mut buffer = BoundedBuffer::new(2);
        assert_eq!(buffer.push("a"), None);
        assert_eq!(buffer.push("b"), None);
        assert_eq!(buffer.push("c"), Some("a"));
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut buffer = BoundedBuffer::new(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.snapshot(), vec![2]);
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity_and_keeps_suffix(
            capacity in 1usize..64,
            items in proptest::collection::vec(any::<u32>(), 0..300),
        ) {
            let mut buffer = BoundedBuffer::new(capacity);
            for item in &items {
                buffer.push(*item);
                prop_assert!(buffer.len() <= capacity);
            }
            let start = items.len().saturating_sub(capacity);
            prop_assert_eq!(buffer.snapshot(), items[start..].to_vec());
        }
    }
}
