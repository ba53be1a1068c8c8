//! Usage tracker — month-scoped, monotonic feature counters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entitlements::tiers::Feature;
use crate::errors::AppError;

/// The calendar-month key for a usage record, from the server clock at the
/// time of the action. Never client-supplied.
pub fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

pub fn current_month() -> String {
    month_key(Utc::now())
}

/// Month-scoped usage counters. Counters are created lazily on first use,
/// only ever incremented, and naturally superseded each new month (old rows
/// stay behind for audit).
#[async_trait]
pub trait UsageTracker: Send + Sync {
    /// Current count for (user, feature, month); 0 if no record exists yet.
    async fn usage(&self, user_id: Uuid, feature: Feature, month: &str) -> Result<i64, AppError>;

    /// Unconditional increment. Returns the new count.
    async fn increment(&self, user_id: Uuid, feature: Feature, month: &str)
        -> Result<i64, AppError>;

    /// Increments only while the pre-increment count is below `cap`, as one
    /// atomic operation: two concurrent calls at one remaining slot must
    /// yield exactly one `Some`. Returns `None` when the cap is reached.
    async fn increment_below(
        &self,
        user_id: Uuid,
        feature: Feature,
        month: &str,
        cap: u32,
    ) -> Result<Option<i64>, AppError>;
}

pub struct PgUsageTracker {
    pool: PgPool,
}

impl PgUsageTracker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageTracker for PgUsageTracker {
    async fn usage(&self, user_id: Uuid, feature: Feature, month: &str) -> Result<i64, AppError> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT count FROM usage_tracking WHERE user_id = $1 AND feature = $2 AND month = $3",
        )
        .bind(user_id)
        .bind(feature.as_str())
        .bind(month)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count.unwrap_or(0))
    }

    async fn increment(
        &self,
        user_id: Uuid,
        feature: Feature,
        month: &str,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO usage_tracking (user_id, feature, month, count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (user_id, feature, month)
            DO UPDATE SET count = usage_tracking.count + 1
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(feature.as_str())
        .bind(month)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn increment_below(
        &self,
        user_id: Uuid,
        feature: Feature,
        month: &str,
        cap: u32,
    ) -> Result<Option<i64>, AppError> {
        if cap == 0 {
            return Ok(None);
        }

        // Single statement so Postgres serializes concurrent callers on the
        // row: the conditional UPDATE observes the committed count, and an
        // unsatisfied WHERE yields no row.
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO usage_tracking (user_id, feature, month, count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (user_id, feature, month)
            DO UPDATE SET count = usage_tracking.count + 1
            WHERE usage_tracking.count < $4
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(feature.as_str())
        .bind(month)
        .bind(i64::from(cap))
        .fetch_optional(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_key_is_year_dash_month() {
        let t = Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap();
        assert_eq!(month_key(t), "2025-03");
    }

    #[test]
    fn month_key_rolls_over_at_month_boundary() {
        let before = Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        assert_ne!(month_key(before), month_key(after));
        assert_eq!(month_key(after), "2025-04");
    }
}
