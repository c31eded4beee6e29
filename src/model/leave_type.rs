use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveType {
    pub id: i64,
    #[schema(example = "Casual Leave")]
    pub name: String,
    pub description: String,
    /// Entitlement ceiling per application
    #[schema(example = 12)]
    pub max_days: i64,
    pub requires_attachment: bool,
    /// Monotonic usage counter, incremented on each apply, never decremented
    pub applications: i64,
}
