//! Reservation code (PNR) allocation.

/// First reservation code handed out on a fresh installation.
pub const DEFAULT_BASE_CODE: u64 = 1_000_000;

/// Issues strictly increasing reservation codes.
///
/// The allocator holds the *next* code to hand out. It is persisted on exit
/// and restored on startup so that codes are never reused across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeAllocator {
    next: u64,
}

impl CodeAllocator {
    /// Create an allocator whose first code is `next`.
    #[must_use]
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Return the next code and advance the counter.
    pub fn next_code(&mut self) -> u64 {
        let code = self.next;
        self.next += 1;
        code
    }

    /// The code the next call to [`next_code`](Self::next_code) will return.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Make sure the counter is past `issued`.
    ///
    /// Returns `true` if the counter had to move.
    pub fn advance_past(&mut self, issued: u64) -> bool {
        if self.next > issued {
            return false;
        }
        self.next = issued + 1;
        true
    }
}

impl Default for CodeAllocator {
    fn default() -> Self {
        Self::starting_at(DEFAULT_BASE_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_starts_at_base() {
        assert_eq!(CodeAllocator::default().peek(), DEFAULT_BASE_CODE);
    }

    #[test]
    fn test_next_code_returns_pre_increment_value() {
        let mut codes = CodeAllocator::starting_at(42);
        assert_eq!(codes.next_code(), 42);
        assert_eq!(codes.next_code(), 43);
        assert_eq!(codes.peek(), 44);
    }

    #[test]
    fn test_codes_strictly_increase() {
        let mut codes = CodeAllocator::default();
        let issued: Vec<u64> = (0..100).map(|_| codes.next_code()).collect();
        assert!(issued.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_advance_past() {
        let mut codes = CodeAllocator::starting_at(10);
        assert!(!codes.advance_past(5));
        assert_eq!(codes.peek(), 10);

        assert!(codes.advance_past(10));
        assert_eq!(codes.peek(), 11);

        assert!(codes.advance_past(20));
        assert_eq!(codes.next_code(), 21);
    }
}
