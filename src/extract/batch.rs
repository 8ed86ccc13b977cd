//! Fixed-size batching of extracted messages.

use super::counter::Counter;
use super::project::TextRecord;
use crate::model::attachment::Attachment;

/// One message ready to be written: its record and renamed attachments.
#[derive(Debug, Clone)]
pub struct ExtractedMessage {
    /// Run-wide mail identifier (`mail-<n>`).
    pub mail_id: u64,
    pub record: TextRecord,
    pub attachments: Vec<Attachment>,
}

/// A sealed group of consecutive messages, numbered from 1.
#[derive(Debug, Clone)]
pub struct Batch {
    pub number: u64,
    /// Messages in arrival order.
    pub messages: Vec<ExtractedMessage>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Groups a stream of messages into batches of `batch_size`.
///
/// Holds at most `batch_size` messages; a batch is handed back the moment
/// it fills up.
#[derive(Debug)]
pub struct BatchAccumulator {
    batch_size: usize,
    open: Vec<ExtractedMessage>,
    batch_numbers: Counter,
}

impl BatchAccumulator {
    /// Create an accumulator. A `batch_size` of 0 is treated as 1.
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            open: Vec::with_capacity(batch_size),
            batch_numbers: Counter::starting_at(1),
        }
    }

    /// Number of messages waiting in the open batch.
    pub fn pending(&self) -> usize {
        self.open.len()
    }

    /// Add a message; returns the sealed batch once it reaches `batch_size`.
    pub fn push(&mut self, message: ExtractedMessage) -> Option<Batch> {
        self.open.push(message);
        if self.open.len() >= self.batch_size {
            Some(self.seal())
        } else {
            None
        }
    }

    /// Seal whatever remains. Returns `None` if nothing is pending.
    pub fn close(&mut self) -> Option<Batch> {
        if self.open.is_empty() {
            None
        } else {
            Some(self.seal())
        }
    }

    fn seal(&mut self) -> Batch {
        let messages = std::mem::replace(&mut self.open, Vec::with_capacity(self.batch_size));
        Batch {
            number: self.batch_numbers.next_value(),
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(mail_id: u64) -> ExtractedMessage {
        ExtractedMessage {
            mail_id,
            record: TextRecord::default(),
            attachments: Vec::new(),
        }
    }

    fn run(total: u64, batch_size: usize) -> Vec<Batch> {
        let mut acc = BatchAccumulator::new(batch_size);
        let mut batches: Vec<Batch> = (0..total).filter_map(|i| acc.push(message(i))).collect();
        batches.extend(acc.close());
        batches
    }

    #[test]
    fn test_batch_count_is_ceiling() {
        for batch_size in 1..=4usize {
            for total in 0..=9u64 {
                let expected = (total as usize).div_ceil(batch_size);
                assert_eq!(run(total, batch_size).len(), expected, "M={total} B={batch_size}");
            }
        }
    }

    #[test]
    fn test_numbers_and_order() {
        let batches = run(5, 2);
        let numbers: Vec<u64> = batches.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        let ids: Vec<Vec<u64>> = batches
            .iter()
            .map(|b| b.messages.iter().map(|m| m.mail_id).collect())
            .collect();
        assert_eq!(ids, vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn test_close_on_empty_emits_nothing() {
        let mut acc = BatchAccumulator::new(3);
        assert!(acc.close().is_none());
        assert!(acc.push(message(0)).is_none());
        assert_eq!(acc.pending(), 1);
        let last = acc.close().unwrap();
        assert_eq!(last.len(), 1);
        assert!(acc.close().is_none());
    }

    #[test]
    fn test_full_last_batch_is_not_repeated() {
        let batches = run(4, 2);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 2));
    }
}
