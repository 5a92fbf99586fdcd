//! Subscription status read model.
//!
//! The billing lifecycle itself (checkout, renewals, dunning) lives outside
//! this service. This module is the read side: the `subscriptions` table is
//! the single canonical source the validator consults, on every call, to
//! decide whether a contractor's widgets may render.

use chrono::{DateTime, Utc};

/// Raw subscription state as recorded by the billing integration.
///
/// Stored as lowercase text in the `subscriptions.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Inactive,
    PastDue,
    Canceled,
    NotStarted,
}

impl SubscriptionState {
    /// Parse the stored status string. Unknown strings map to `Inactive`:
    /// an unrecognized billing state must never unlock a widget.
    pub fn from_db(s: &str) -> Self {
        match s {
            "active" => SubscriptionState::Active,
            "past_due" => SubscriptionState::PastDue,
            "canceled" => SubscriptionState::Canceled,
            "not_started" => SubscriptionState::NotStarted,
            _ => SubscriptionState::Inactive,
        }
    }
}

/// Represents a subscription record from the database.
///
/// # Database Table
///
/// Maps to the `subscriptions` table, one row per contractor.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionStatus {
    /// Contractor this subscription belongs to
    pub contractor_id: uuid::Uuid,

    /// Raw billing status string ("active", "past_due", ...)
    pub status: String,

    /// End of the currently paid-for period
    pub current_period_end: DateTime<Utc>,

    /// Whether the subscription is scheduled to lapse at period end
    pub cancel_at_period_end: bool,

    /// Timestamp of the last billing-side update
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionStatus {
    /// Derived admission boolean: the subscription counts as active only
    /// when the status is `active` AND the paid period has not ended.
    ///
    /// `cancel_at_period_end` does not affect this: a canceled-at-period-end
    /// subscription stays usable until `current_period_end` passes.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        SubscriptionState::from_db(&self.status) == SubscriptionState::Active
            && self.current_period_end > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn status(state: &str, period_end: DateTime<Utc>) -> SubscriptionStatus {
        SubscriptionStatus {
            contractor_id: Uuid::new_v4(),
            status: state.to_string(),
            current_period_end: period_end,
            cancel_at_period_end: false,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn active_within_period_is_active() {
        let now = Utc::now();
        assert!(status("active", now + Duration::days(10)).is_active(now));
    }

    #[test]
    fn active_past_period_end_is_not_active() {
        let now = Utc::now();
        assert!(!status("active", now - Duration::seconds(1)).is_active(now));
    }

    #[test]
    fn non_active_states_are_never_active() {
        let now = Utc::now();
        let period_end = now + Duration::days(10);
        for state in ["inactive", "past_due", "canceled", "not_started"] {
            assert!(!status(state, period_end).is_active(now), "state {state}");
        }
    }

    #[test]
    fn unknown_state_fails_closed() {
        let now = Utc::now();
        assert!(!status("trialing", now + Duration::days(10)).is_active(now));
    }

    #[test]
    fn cancel_at_period_end_stays_usable_until_period_ends() {
        let now = Utc::now();
        let mut s = status("active", now + Duration::days(3));
        s.cancel_at_period_end = true;
        assert!(s.is_active(now));
    }
}
