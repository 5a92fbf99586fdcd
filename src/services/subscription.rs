//! Subscription status provider.
//!
//! The single canonical read path for "is this contractor's subscription
//! active". Every admission decision goes through [`fetch_status`]; no other
//! module queries billing state. The billing integration writes the
//! `subscriptions` table; this service only reads it.

use crate::{db::DbPool, models::subscription::SubscriptionStatus};
use uuid::Uuid;

/// Fetch the current subscription row for a contractor.
///
/// Returns `Ok(None)` when the contractor has no subscription row at all
/// (never subscribed), which the validator treats the same as an inactive
/// subscription. A query error is returned as-is: the validator maps it to
/// a fail-closed denial, never to an allow.
pub async fn fetch_status(
    pool: &DbPool,
    contractor_id: Uuid,
) -> Result<Option<SubscriptionStatus>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionStatus>(
        "SELECT contractor_id, status, current_period_end, cancel_at_period_end, updated_at
         FROM subscriptions
         WHERE contractor_id = $1",
    )
    .bind(contractor_id)
    .fetch_optional(pool)
    .await
}
