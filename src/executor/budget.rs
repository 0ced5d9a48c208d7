//! Fan-out result budget

/// Remaining documents permitted across one fan-out.
///
/// Created when a fan-out starts and owned by it; the effective bound is
/// `min(total_count, limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    effective: u64,
    remaining: u64,
}

impl Budget {
    /// Creates a budget.
    ///
    /// A missing or zero `limit` falls back to `fetch_batch`.
    pub fn new(total_count: u64, limit: Option<u64>, fetch_batch: u64) -> Self {
        let limit = match limit {
            Some(n) if n > 0 => n,
            _ => fetch_batch,
        };
        let effective = total_count.min(limit);
        Self {
            effective,
            remaining: effective,
        }
    }

    /// The bound this budget started with
    pub fn effective(&self) -> u64 {
        self.effective
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Documents consumed so far
    pub fn consumed(&self) -> u64 {
        self.effective - self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Charges `count` yielded documents against the budget
    pub fn consume(&mut self, count: u64) {
        self.remaining = self.remaining.saturating_sub(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_is_min_of_total_and_limit() {
        assert_eq!(Budget::new(10, Some(6), 1000).effective(), 6);
        assert_eq!(Budget::new(4, Some(6), 1000).effective(), 4);
    }

    #[test]
    fn test_missing_limit_uses_fetch_batch() {
        assert_eq!(Budget::new(5000, None, 1000).effective(), 1000);
        assert_eq!(Budget::new(5000, Some(0), 1000).effective(), 1000);
        assert_eq!(Budget::new(20, None, 1000).effective(), 20);
    }

    #[test]
    fn test_consume() {
        let mut budget = Budget::new(10, Some(6), 1000);
        budget.consume(2);
        assert_eq!(budget.remaining(), 4);
        assert_eq!(budget.consumed(), 2);
        assert!(!budget.is_exhausted());

        budget.consume(9);
        assert_eq!(budget.remaining(), 0);
        assert!(budget.is_exhausted());
        assert_eq!(budget.consumed(), 6);
    }

    #[test]
    fn test_empty_total_is_exhausted() {
        assert!(Budget::new(0, Some(5), 1000).is_exhausted());
    }
}
