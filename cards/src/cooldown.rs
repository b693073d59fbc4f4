use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

use crate::types::UserAccount;

pub const DEFAULT_COOLDOWN_HOURS: i64 = 24;

/// Time left until the next claim, displayed as whole hours and minutes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RemainingTime(TimeDelta);

impl RemainingTime {
    pub fn new(remaining: TimeDelta) -> Self {
        RemainingTime(remaining.max(TimeDelta::zero()))
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }

    // Partial minutes round up so a user on cooldown never sees "0h 0m"
    fn total_minutes(&self) -> i64 {
        let seconds = self.0.num_seconds();
        let minutes = seconds / 60;
        if seconds % 60 > 0 || (seconds == 0 && self.0 > TimeDelta::zero()) {
            minutes + 1
        } else {
            minutes
        }
    }

    pub fn hours(&self) -> i64 {
        self.total_minutes() / 60
    }

    pub fn minutes(&self) -> i64 {
        self.total_minutes() % 60
    }
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours(), self.minutes())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CooldownStatus {
    Ready,
    OnCooldown { remaining: RemainingTime },
}

/// Enforces the minimum time between two successful claims by one user.
///
/// The tracker only reads `last_pack_claimed`; the stamp itself is written by
/// the store after a mint succeeds, so a failed claim never starts a cooldown.
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    window: TimeDelta,
}

impl Default for CooldownTracker {
    fn default() -> Self {
        CooldownTracker::new(TimeDelta::hours(DEFAULT_COOLDOWN_HOURS))
    }
}

impl CooldownTracker {
    pub fn new(window: TimeDelta) -> Self {
        CooldownTracker {
            window: window.max(TimeDelta::zero()),
        }
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    pub fn next_claim_at(&self, user: &UserAccount) -> Option<DateTime<Utc>> {
        user.last_pack_claimed.map(|last| last + self.window)
    }

    pub fn check_and_reserve(&self, user: &UserAccount, now: DateTime<Utc>) -> CooldownStatus {
        let Some(last) = user.last_pack_claimed else {
            return CooldownStatus::Ready;
        };

        // A stamp in the future (clock skew) counts as "just claimed"
        let elapsed = now.signed_duration_since(last).max(TimeDelta::zero());
        if elapsed >= self.window {
            CooldownStatus::Ready
        } else {
            CooldownStatus::OnCooldown {
                remaining: RemainingTime::new(self.window - elapsed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(last_pack_claimed: Option<DateTime<Utc>>) -> UserAccount {
        UserAccount {
            twitch_id: "1001".to_string(),
            display_name: "viewer".to_string(),
            profile_image_url: None,
            currency: 0,
            last_pack_claimed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_never_claimed_is_ready() {
        let tracker = CooldownTracker::default();
        assert_eq!(
            tracker.check_and_reserve(&user(None), Utc::now()),
            CooldownStatus::Ready
        );
        assert!(tracker.next_claim_at(&user(None)).is_none());
    }

    #[test]
    fn test_one_hour_after_claim() {
        let tracker = CooldownTracker::default();
        let claimed = Utc::now();
        let status = tracker.check_and_reserve(&user(Some(claimed)), claimed + TimeDelta::hours(1));

        match status {
            CooldownStatus::OnCooldown { remaining } => {
                assert_eq!(remaining.hours(), 23);
                assert_eq!(remaining.minutes(), 0);
                assert_eq!(remaining.to_string(), "23h 0m");
            }
            CooldownStatus::Ready => panic!("expected cooldown"),
        }
    }

    #[test]
    fn test_window_boundary_is_ready() {
        let tracker = CooldownTracker::default();
        let claimed = Utc::now();
        let account = user(Some(claimed));

        assert_eq!(
            tracker.check_and_reserve(&account, claimed + TimeDelta::hours(24)),
            CooldownStatus::Ready
        );
        assert!(matches!(
            tracker.check_and_reserve(&account, claimed + TimeDelta::hours(24) - TimeDelta::seconds(1)),
            CooldownStatus::OnCooldown { .. }
        ));
        assert_eq!(
            tracker.next_claim_at(&account),
            Some(claimed + TimeDelta::hours(24))
        );
    }

    #[test]
    fn test_future_stamp_uses_full_window() {
        let tracker = CooldownTracker::new(TimeDelta::hours(2));
        let now = Utc::now();
        let status = tracker.check_and_reserve(&user(Some(now + TimeDelta::minutes(30))), now);
        assert_eq!(
            status,
            CooldownStatus::OnCooldown {
                remaining: RemainingTime::new(TimeDelta::hours(2))
            }
        );
    }

    #[test]
    fn test_remaining_rounds_partial_minutes_up() {
        let remaining = RemainingTime::new(TimeDelta::seconds(61));
        assert_eq!((remaining.hours(), remaining.minutes()), (0, 2));

        let remaining = RemainingTime::new(TimeDelta::milliseconds(500));
        assert_eq!(remaining.to_string(), "0h 1m");

        let remaining = RemainingTime::new(TimeDelta::minutes(135));
        assert_eq!(remaining.to_string(), "2h 15m");

        let remaining = RemainingTime::new(TimeDelta::minutes(-5));
        assert_eq!(remaining.to_string(), "0h 0m");
    }
}
