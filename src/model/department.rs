use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct Department {
    pub id: i64,
    pub name: String,
    /// Unique uppercase code, e.g. "CSE"
    pub code: String,
}

/// Department with its dynamically computed employee count. The count is a
/// case-insensitive match of `users.department` against the code.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct DepartmentWithCount {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[schema(example = 12)]
    pub employees: i64,
}
