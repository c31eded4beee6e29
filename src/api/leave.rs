use crate::{
    auth::auth::AuthUser,
    errors::ApiError,
    model::leave::{Leave, LeaveStatus, inclusive_days},
    model::leave_type::LeaveType,
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, SqlitePool};
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeaveRequest {
    /// Leave type id
    #[schema(example = 1)]
    pub leave_type: i64,
    #[schema(value_type = String, format = "date", example = "2026-01-01")]
    pub from_date: NaiveDate,
    #[schema(value_type = String, format = "date", example = "2026-01-03")]
    pub to_date: NaiveDate,
    pub reason: String,
    pub attachment_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveStatus {
    /// "approved" or "rejected"
    #[schema(example = "approved")]
    pub status: String,
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct LeaveCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveTypeBrief {
    pub id: i64,
    pub name: String,
    pub max_days: i64,
    pub requires_attachment: bool,
}

/// A leave as the owning user sees it, leave type joined in.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyLeave {
    pub id: i64,
    pub leave_type: LeaveTypeBrief,
    #[schema(value_type = String, format = "date")]
    pub from_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to_date: NaiveDate,
    pub total_days: i64,
    pub reason: String,
    pub attachment_url: Option<String>,
    pub status: String,
    pub notification_shown: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct MyLeaveRow {
    id: i64,
    from_date: NaiveDate,
    to_date: NaiveDate,
    total_days: i64,
    reason: String,
    attachment_url: Option<String>,
    status: String,
    notification_shown: bool,
    created_at: NaiveDateTime,
    type_id: i64,
    type_name: String,
    type_max_days: i64,
    type_requires_attachment: bool,
}

impl From<MyLeaveRow> for MyLeave {
    fn from(row: MyLeaveRow) -> Self {
        MyLeave {
            id: row.id,
            leave_type: LeaveTypeBrief {
                id: row.type_id,
                name: row.type_name,
                max_days: row.type_max_days,
                requires_attachment: row.type_requires_attachment,
            },
            from_date: row.from_date,
            to_date: row.to_date,
            total_days: row.total_days,
            reason: row.reason,
            attachment_url: row.attachment_url,
            status: row.status,
            notification_shown: row.notification_shown,
            created_at: row.created_at,
        }
    }
}

/// A leave as the admin overview shows it, owner joined in.
#[derive(Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminLeaveRow {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub user_department: String,
    pub leave_type: String,
    #[schema(value_type = String, format = "date")]
    pub from_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to_date: NaiveDate,
    pub total_days: i64,
    pub reason: String,
    pub attachment_url: Option<String>,
    pub status: String,
    pub notification_shown: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

async fn fetch_leave(pool: &SqlitePool, id: i64) -> Result<Leave, ApiError> {
    sqlx::query_as::<_, Leave>("SELECT * FROM leaves WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch leave", e))?
        .ok_or_else(|| ApiError::NotFound("Leave not found".to_string()))
}

#[utoipa::path(
    post,
    path = "/leaves/apply",
    request_body = ApplyLeaveRequest,
    responses(
        (status = 201, description = "Leave applied, status pending"),
        (status = 400, description = "Bad date range or span exceeds the type ceiling"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Invalid leave type")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<ApplyLeaveRequest>,
) -> Result<HttpResponse, ApiError> {
    if payload.reason.trim().is_empty() {
        return Err(ApiError::Validation("All fields are required".to_string()));
    }
    if payload.to_date < payload.from_date {
        return Err(ApiError::Validation(
            "fromDate cannot be after toDate".to_string(),
        ));
    }

    let leave_type = sqlx::query_as::<_, LeaveType>("SELECT * FROM leave_types WHERE id = ?")
        .bind(payload.leave_type)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch leave type", e))?
        .ok_or_else(|| ApiError::NotFound("Invalid leave type".to_string()))?;

    let total_days = inclusive_days(payload.from_date, payload.to_date);

    // Policy: the single application's span is checked against the type's
    // absolute ceiling, not the caller's remaining balance.
    if total_days > leave_type.max_days {
        return Err(ApiError::Quota(format!(
            "You cannot apply more than {} days for {}",
            leave_type.max_days, leave_type.name
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leaves (user_id, leave_type_id, from_date, to_date, total_days, reason, attachment_url)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user.id)
    .bind(leave_type.id)
    .bind(payload.from_date)
    .bind(payload.to_date)
    .bind(total_days)
    .bind(payload.reason.trim())
    .bind(&payload.attachment_url)
    .execute(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to apply leave", e))?;

    // Usage metric only: incremented on every apply and never decremented,
    // even if the leave is later rejected or deleted.
    sqlx::query("UPDATE leave_types SET applications = applications + 1 WHERE id = ?")
        .bind(leave_type.id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to bump applications counter", e))?;

    let leave = fetch_leave(pool.get_ref(), result.last_insert_rowid()).await?;

    info!(
        user_id = auth.user.id,
        leave_id = leave.id,
        total_days,
        "Leave applied"
    );

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Leave applied successfully",
        "leave": leave,
    })))
}

#[utoipa::path(
    get,
    path = "/leaves/my",
    responses(
        (status = 200, description = "Caller's leaves, newest first"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, MyLeaveRow>(
        r#"
        SELECT
            l.id, l.from_date, l.to_date, l.total_days, l.reason, l.attachment_url,
            l.status, l.notification_shown, l.created_at,
            t.id AS type_id, t.name AS type_name, t.max_days AS type_max_days,
            t.requires_attachment AS type_requires_attachment
        FROM leaves l
        JOIN leave_types t ON t.id = l.leave_type_id
        WHERE l.user_id = ?
        ORDER BY l.created_at DESC, l.id DESC
        "#,
    )
    .bind(auth.user.id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to fetch your leaves", e))?;

    let leaves: Vec<MyLeave> = rows.into_iter().map(MyLeave::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": leaves.len(),
        "leaves": leaves,
    })))
}

#[utoipa::path(
    get,
    path = "/leaves",
    responses(
        (status = 200, description = "All leaves system-wide, newest first"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn all_leaves(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let leaves = sqlx::query_as::<_, AdminLeaveRow>(
        r#"
        SELECT
            l.id, l.user_id, u.full_name AS user_name, u.email AS user_email,
            u.department AS user_department, t.name AS leave_type,
            l.from_date, l.to_date, l.total_days, l.reason, l.attachment_url,
            l.status, l.notification_shown, l.created_at
        FROM leaves l
        JOIN users u ON u.id = l.user_id
        JOIN leave_types t ON t.id = l.leave_type_id
        ORDER BY l.created_at DESC, l.id DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to fetch all leaves", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": leaves.len(),
        "leaves": leaves,
    })))
}

#[utoipa::path(
    put,
    path = "/leaves/{id}/status",
    params(("id" = i64, Path, description = "Leave id")),
    request_body = UpdateLeaveStatus,
    responses(
        (status = 200, description = "Transition applied, notification flag reset"),
        (status = 400, description = "Invalid status or leave already processed"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn set_leave_status(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateLeaveStatus>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let status: LeaveStatus = payload
        .status
        .parse()
        .map_err(|_| ApiError::Validation("Invalid status".to_string()))?;
    if status == LeaveStatus::Pending {
        return Err(ApiError::Validation("Invalid status".to_string()));
    }

    let leave_id = path.into_inner();

    // Approved/rejected are terminal; only pending leaves transition. Every
    // transition resets the owner's notification flag.
    let result = sqlx::query(
        r#"
        UPDATE leaves
        SET status = ?, notification_shown = 0, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(status.to_string())
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to update leave status", e))?;

    if result.rows_affected() == 0 {
        // Distinguish a missing leave from one already decided
        fetch_leave(pool.get_ref(), leave_id).await?;
        return Err(ApiError::Validation(
            "Leave already processed".to_string(),
        ));
    }

    let leave = fetch_leave(pool.get_ref(), leave_id).await?;

    info!(leave_id, status = %status, "Leave status updated");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Leave {status} successfully"),
        "leave": leave,
    })))
}

#[utoipa::path(
    get,
    path = "/leaves/my/counts",
    responses(
        (status = 200, description = "Caller's leave counts by status"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leave_counts(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let counts = sqlx::query_as::<_, LeaveCounts>(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
            COALESCE(SUM(CASE WHEN status = 'approved' THEN 1 ELSE 0 END), 0) AS approved,
            COALESCE(SUM(CASE WHEN status = 'rejected' THEN 1 ELSE 0 END), 0) AS rejected
        FROM leaves
        WHERE user_id = ?
        "#,
    )
    .bind(auth.user.id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to count leaves", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "counts": counts,
    })))
}

#[utoipa::path(
    get,
    path = "/leaves/notifications/pending",
    responses(
        (status = 200, description = "Caller's decided-but-unseen leaves, newest decision first"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending_notifications(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, MyLeaveRow>(
        r#"
        SELECT
            l.id, l.from_date, l.to_date, l.total_days, l.reason, l.attachment_url,
            l.status, l.notification_shown, l.created_at,
            t.id AS type_id, t.name AS type_name, t.max_days AS type_max_days,
            t.requires_attachment AS type_requires_attachment
        FROM leaves l
        JOIN leave_types t ON t.id = l.leave_type_id
        WHERE l.user_id = ?
          AND l.notification_shown = 0
          AND l.status IN ('approved', 'rejected')
        ORDER BY l.updated_at DESC, l.id DESC
        "#,
    )
    .bind(auth.user.id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to fetch pending notifications", e))?;

    let leaves: Vec<MyLeave> = rows.into_iter().map(MyLeave::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": leaves.len(),
        "leaves": leaves,
    })))
}

#[utoipa::path(
    put,
    path = "/leaves/{id}/mark-notified",
    params(("id" = i64, Path, description = "Leave id")),
    responses(
        (status = 200, description = "Notification acknowledged (idempotent)"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn mark_notified(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    // Scoped to the owning user; a foreign caller gets the same 404 as a
    // missing id. Re-acknowledging is a no-op that still succeeds.
    let result = sqlx::query("UPDATE leaves SET notification_shown = 1 WHERE id = ? AND user_id = ?")
        .bind(leave_id)
        .bind(auth.user.id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to acknowledge notification", e))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Leave not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Notification acknowledged",
    })))
}

#[utoipa::path(
    get,
    path = "/leaves/remaining/{type_id}",
    params(("type_id" = i64, Path, description = "Leave type id")),
    responses(
        (status = 200, description = "Caller's remaining balance for the type"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Invalid leave type")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn remaining_balance(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let type_id = path.into_inner();

    let leave_type = sqlx::query_as::<_, LeaveType>("SELECT * FROM leave_types WHERE id = ?")
        .bind(type_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch leave type", e))?
        .ok_or_else(|| ApiError::NotFound("Invalid leave type".to_string()))?;

    // Rejected (and deleted) leaves do not consume quota
    let used_days = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(total_days), 0)
        FROM leaves
        WHERE user_id = ? AND leave_type_id = ? AND status IN ('approved', 'pending')
        "#,
    )
    .bind(auth.user.id)
    .bind(type_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to compute used days", e))?;

    let remaining_days = (leave_type.max_days - used_days).max(0);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "maxDays": leave_type.max_days,
        "usedDays": used_days,
        "remainingDays": remaining_days,
    })))
}

#[utoipa::path(
    delete,
    path = "/leaves/{id}",
    params(("id" = i64, Path, description = "Leave id")),
    responses(
        (status = 200, description = "Leave deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let leave_id = path.into_inner();

    // Hard delete; the leave type's applications counter stays as-is
    let result = sqlx::query("DELETE FROM leaves WHERE id = ?")
        .bind(leave_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to delete leave", e))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Leave not found".to_string()));
    }

    info!(leave_id, "Leave deleted");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave deleted successfully",
    })))
}
