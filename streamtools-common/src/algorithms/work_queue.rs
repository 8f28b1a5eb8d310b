use super::flow_error::FlowError;
use std::collections::VecDeque;
use std::str::FromStr;

/// Storage used for the traversal frontier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum QueueStrategy {
    /// Grows as needed; never overflows.
    #[default]
    Growable,
    /// Fixed-size circular buffer. Overflow is reported, not overwritten.
    Bounded(usize),
    /// Circular buffer sized `4 * (rows + columns)` for the grid being traversed.
    ReferenceBound,
}

impl QueueStrategy {
    /// Replaces `ReferenceBound` by the concrete capacity for a grid.
    pub fn resolve(self, rows: isize, columns: isize) -> QueueStrategy {
        match self {
            QueueStrategy::ReferenceBound => {
                QueueStrategy::Bounded((4 * (rows.max(0) + columns.max(0))).max(1) as usize)
            }
            other => other,
        }
    }
}

impl FromStr for QueueStrategy {
    type Err = String;

    /// Accepts `growable`, `auto` or a positive capacity.
    fn from_str(s: &str) -> Result<QueueStrategy, String> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "" | "growable" | "none" => Ok(QueueStrategy::Growable),
            "auto" => Ok(QueueStrategy::ReferenceBound),
            _ => match s.parse::<usize>() {
                Ok(n) if n > 0 => Ok(QueueStrategy::Bounded(n)),
                _ => Err(format!("Invalid queue capacity '{}'.", s)),
            },
        }
    }
}

enum Storage<T> {
    Growable(VecDeque<T>),
    Ring {
        buffer: Vec<Option<T>>,
        head: usize,
        len: usize,
    },
}

/// FIFO work queue.
pub struct WorkQueue<T> {
    storage: Storage<T>,
}

impl<T> WorkQueue<T> {
    /// Creates a queue for traversing a grid of `rows` by `columns` cells.
    pub fn new(strategy: QueueStrategy, rows: isize, columns: isize) -> WorkQueue<T> {
        let storage = match strategy.resolve(rows, columns) {
            QueueStrategy::Growable | QueueStrategy::ReferenceBound => Storage::Growable(VecDeque::new()),
            QueueStrategy::Bounded(capacity) => {
                let mut buffer = Vec::with_capacity(capacity);
                buffer.resize_with(capacity, || None);
                Storage::Ring {
                    buffer,
                    head: 0,
                    len: 0,
                }
            }
        };
        WorkQueue { storage }
    }

    pub fn push(&mut self, item: T) -> Result<(), FlowError> {
        match &mut self.storage {
            Storage::Growable(queue) => {
                queue.push_back(item);
                Ok(())
            }
            Storage::Ring { buffer, head, len } => {
                let capacity = buffer.len();
                if *len == capacity {
                    return Err(FlowError::QueueOverflow { capacity });
                }
                buffer[(*head + *len) % capacity] = Some(item);
                *len += 1;
                Ok(())
            }
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        match &mut self.storage {
            Storage::Growable(queue) => queue.pop_front(),
            Storage::Ring { buffer, head, len } => {
                if *len == 0 {
                    return None;
                }
                let item = buffer[*head].take();
                *head = (*head + 1) % buffer.len();
                *len -= 1;
                item
            }
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Growable(queue) => queue.len(),
            Storage::Ring { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `None` for a growable queue.
    pub fn capacity(&self) -> Option<usize> {
        match &self.storage {
            Storage::Growable(_) => None,
            Storage::Ring { buffer, .. } => Some(buffer.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_wraps_around() {
        let mut q = WorkQueue::new(QueueStrategy::Bounded(3), 1, 1);
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.pop(), Some(1));
        q.push(3).unwrap();
        q.push(4).unwrap();
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), Some(4));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_ring_overflow_is_reported() {
        let mut q = WorkQueue::new(QueueStrategy::Bounded(2), 1, 1);
        q.push('a').unwrap();
        q.push('b').unwrap();
        assert_eq!(q.push('c'), Err(FlowError::QueueOverflow { capacity: 2 }));
        // the unread entries survive
        assert_eq!(q.pop(), Some('a'));
        assert_eq!(q.pop(), Some('b'));
    }

    #[test]
    fn test_zero_capacity_ring() {
        let mut q: WorkQueue<u8> = WorkQueue::new(QueueStrategy::Bounded(0), 1, 1);
        assert!(q.push(1).is_err());
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_growable() {
        let mut q = WorkQueue::new(QueueStrategy::Growable, 1, 1);
        for i in 0..1000 {
            q.push(i).unwrap();
        }
        assert_eq!(q.capacity(), None);
        assert_eq!(q.pop(), Some(0));
        assert_eq!(q.len(), 999);
    }

    #[test]
    fn test_reference_bound_queue() {
        let q: WorkQueue<usize> = WorkQueue::new(QueueStrategy::ReferenceBound, 3, 5);
        assert_eq!(q.capacity(), Some(32));
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("16".parse::<QueueStrategy>(), Ok(QueueStrategy::Bounded(16)));
        assert_eq!("auto".parse::<QueueStrategy>(), Ok(QueueStrategy::ReferenceBound));
        assert_eq!("growable".parse::<QueueStrategy>(), Ok(QueueStrategy::Growable));
        assert!("-3".parse::<QueueStrategy>().is_err());
        assert_eq!(
            QueueStrategy::ReferenceBound.resolve(10, 20),
            QueueStrategy::Bounded(120)
        );
    }
}
