//! Run-scoped monotonic counters.

/// A monotonically increasing counter that never resets within a run.
///
/// Each counter is owned by the component that advances it: mail ids and
/// the processed count by the pipeline, batch numbers by the accumulator,
/// anonymous attachment names by the writer.
#[derive(Debug, Clone)]
pub struct Counter {
    next: u64,
}

impl Counter {
    /// A counter whose first value is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Return the current value and advance.
    pub fn next_value(&mut self) -> u64 {
        let value = self.next;
        self.next += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_gapless() {
        let mut c = Counter::starting_at(1);
        assert_eq!(c.next_value(), 1);
        assert_eq!(c.next_value(), 2);
        assert_eq!(c.next_value(), 3);
    }
}
