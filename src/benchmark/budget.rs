//! Shared request budget
//!
//! This is the ONLY state mutated by more than one worker thread. Everything
//! else a worker touches is thread-local.

use std::sync::atomic::{AtomicU64, Ordering};

/// Requests not yet claimed by any worker
///
/// The remaining count is only reachable through `claim`, so grants can
/// never overlap or exceed the initial total.
#[derive(Debug)]
pub struct RequestBudget {
    remaining: AtomicU64,
}

impl RequestBudget {
    /// Create a budget holding `total` requests
    pub fn new(total: u64) -> Self {
        Self {
            remaining: AtomicU64::new(total),
        }
    }

    /// Claim up to `max` requests.
    ///
    /// Returns the number actually granted: `min(max, remaining)` at the
    /// moment of the claim, and 0 once the budget is exhausted.
    #[inline]
    pub fn claim(&self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }

        match self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |remaining| {
                if remaining == 0 {
                    None
                } else {
                    Some(remaining - remaining.min(max))
                }
            }) {
            Ok(previous) => previous.min(max),
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_claim_requests() {
        let budget = RequestBudget::new(25);

        assert_eq!(budget.claim(10), 10);
        assert_eq!(budget.claim(10), 10);
        // Final shorter batch
        assert_eq!(budget.claim(10), 5);

        // Exhausted
        assert_eq!(budget.claim(10), 0);
        assert_eq!(budget.claim(1), 0);
    }

    #[test]
    fn test_zero_claims() {
        let budget = RequestBudget::new(3);
        assert_eq!(budget.claim(0), 0);
        assert_eq!(budget.claim(5), 3);

        let empty = RequestBudget::new(0);
        assert_eq!(empty.claim(1), 0);
    }

    fn hammer(total: u64, threads: usize, max_batch: u64) -> u64 {
        let budget = Arc::new(RequestBudget::new(total));
        let start = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let budget = Arc::clone(&budget);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    // Vary the batch size per thread (1..=max_batch)
                    let batch = (i as u64 % max_batch) + 1;
                    start.wait();
                    let mut claimed = 0u64;
                    loop {
                        let granted = budget.claim(batch);
                        assert!(granted <= batch);
                        if granted == 0 {
                            break;
                        }
                        claimed += granted;
                    }
                    claimed
                })
            })
            .collect();

        let total_claimed = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(budget.claim(u64::MAX), 0);
        total_claimed
    }

    #[test]
    fn test_concurrent_claims() {
        assert_eq!(hammer(1000, 4, 10), 1000);
        assert_eq!(hammer(1, 8, 3), 1);
        assert_eq!(hammer(997, 16, 7), 997);
    }

    #[test]
    fn test_concurrent_claims_many_threads() {
        assert_eq!(hammer(10_000, 1000, 16), 10_000);
    }
}
