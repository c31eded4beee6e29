use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Leave lifecycle: `pending` is the only initial state; `approved` and
/// `rejected` are terminal and reachable only through an admin decision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Leave {
    pub id: i64,
    pub user_id: i64,
    pub leave_type_id: i64,
    #[schema(value_type = String, format = "date", example = "2026-01-01")]
    pub from_date: NaiveDate,
    #[schema(value_type = String, format = "date", example = "2026-01-03")]
    pub to_date: NaiveDate,
    /// Inclusive day span, fixed at creation time
    #[schema(example = 3)]
    pub total_days: i64,
    pub reason: String,
    pub attachment_url: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    /// Whether the owner has acknowledged the admin decision
    pub notification_shown: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

/// Inclusive day count between two dates; both endpoints count.
pub fn inclusive_days(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days() + 1
}
