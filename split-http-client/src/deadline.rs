//! Client-wide wall-clock deadline.

use std::time::Duration;
use tokio::time::Instant;

// Budgets too large to represent are clamped to this horizon.
const MAX_BUDGET: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// A fixed point in time after which no further requests are issued.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    budget: Duration,
    expires_at: Instant,
}

impl Deadline {
    /// Start a deadline that expires `budget` from now.
    pub fn after(budget: Duration) -> Self {
        let now = Instant::now();
        Self {
            budget,
            expires_at: now + budget.min(MAX_BUDGET),
        }
    }

    /// The budget this deadline was started with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// The instant the deadline expires.
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Whether the deadline has been reached.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_budget() {
        let deadline = Deadline::after(Duration::from_secs(1));
        assert!(!deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::from_secs(1));

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(!deadline.is_expired());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_is_already_expired() {
        let deadline = Deadline::after(Duration::ZERO);
        assert!(deadline.is_expired());
    }
}
