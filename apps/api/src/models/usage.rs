use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One month-scoped usage counter row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UsageRow {
    pub user_id: Uuid,
    pub feature: String,
    pub month: String,
    pub count: i64,
}
