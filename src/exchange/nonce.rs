use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::WexError;

/// Largest nonce the exchange accepts.
pub const MAX_NONCE: u64 = 4_294_967_294;

/// Strictly increasing nonce source shared by every request of one client.
///
/// Each value is `max(last + 1, now_secs)`, so restarts keep moving forward as
/// long as fewer than one request per second was issued on average.
#[derive(Debug)]
pub struct NonceSource {
    last: AtomicU64,
    follow_clock: bool,
}

impl NonceSource {
    /// Seeded from the wall clock.
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
            follow_clock: true,
        }
    }

    /// Plain counter; the first issued value is `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            last: AtomicU64::new(start.saturating_sub(1)),
            follow_clock: false,
        }
    }

    fn now_secs() -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }

    pub fn next(&self) -> Result<u64, WexError> {
        let floor = if self.follow_clock { Self::now_secs() } else { 0 };
        let mut issued = 0;
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                let candidate = (last + 1).max(floor);
                if candidate > MAX_NONCE {
                    return None;
                }
                issued = candidate;
                Some(candidate)
            })
            .map_err(|_| WexError::NonceExhausted)?;
        Ok(issued)
    }

    /// Make sure the next issued value is at least `nonce`.
    pub fn advance_to(&self, nonce: u64) {
        self.last.fetch_max(nonce.saturating_sub(1), Ordering::SeqCst);
    }

    pub fn last(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

impl Default for NonceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counter_starts_at_seed() {
        let n = NonceSource::starting_at(10);
        assert_eq!(n.next().unwrap(), 10);
        assert_eq!(n.next().unwrap(), 11);
    }

    #[test]
    fn test_clock_seeded() {
        let n = NonceSource::new();
        let first = n.next().unwrap();
        assert!(first > 1_500_000_000);
        assert!(n.next().unwrap() > first);
    }

    #[test]
    fn test_advance_to() {
        let n = NonceSource::starting_at(1);
        n.advance_to(500);
        assert_eq!(n.next().unwrap(), 500);
        // never moves backwards
        n.advance_to(3);
        assert_eq!(n.next().unwrap(), 501);
    }

    #[test]
    fn test_exhausted() {
        let n = NonceSource::starting_at(MAX_NONCE);
        assert_eq!(n.next().unwrap(), MAX_NONCE);
        assert!(matches!(n.next(), Err(WexError::NonceExhausted)));
    }

    #[test]
    fn test_concurrent_unique() {
        let n = Arc::new(NonceSource::starting_at(1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let n = n.clone();
                std::thread::spawn(move || (0..250).map(|_| n.next().unwrap()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 2000);
        assert_eq!(*all.last().unwrap(), 2000);
    }
}
