use crate::{auth::auth::AuthUser, errors::ApiError, model::leave_type::LeaveType};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeaveType {
    #[schema(example = "Casual Leave")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 12)]
    pub max_days: i64,
    pub requires_attachment: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeaveType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub max_days: Option<i64>,
    pub requires_attachment: Option<bool>,
}

async fn fetch_leave_type(pool: &SqlitePool, id: i64) -> Result<LeaveType, ApiError> {
    sqlx::query_as::<_, LeaveType>("SELECT * FROM leave_types WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch leave type", e))?
        .ok_or_else(|| ApiError::NotFound("Leave type not found".to_string()))
}

#[utoipa::path(
    get,
    path = "/leave-types",
    responses((status = 200, description = "All leave types, sorted by name")),
    tag = "LeaveType"
)]
pub async fn list_leave_types(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let leave_types = sqlx::query_as::<_, LeaveType>("SELECT * FROM leave_types ORDER BY name")
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch leave types", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "leaveTypes": leave_types,
    })))
}

#[utoipa::path(
    post,
    path = "/leave-types",
    request_body = CreateLeaveType,
    responses(
        (status = 201, description = "Leave type created"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Leave type already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "LeaveType"
)]
pub async fn create_leave_type(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateLeaveType>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() || payload.max_days < 1 {
        return Err(ApiError::Validation(
            "Name & maxDays are required".to_string(),
        ));
    }

    let result = sqlx::query(
        "INSERT INTO leave_types (name, description, max_days, requires_attachment) VALUES (?, ?, ?, ?)",
    )
    .bind(payload.name.trim())
    .bind(payload.description.clone().unwrap_or_default())
    .bind(payload.max_days)
    .bind(payload.requires_attachment.unwrap_or(false))
    .execute(pool.get_ref())
    .await;

    let result = match result {
        Ok(r) => r,
        Err(sqlx::Error::Database(db_err))
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            return Err(ApiError::Conflict("Leave type already exists".to_string()));
        }
        Err(e) => return Err(ApiError::internal("Failed to add leave type", e)),
    };

    let leave_type = fetch_leave_type(pool.get_ref(), result.last_insert_rowid()).await?;

    info!(name = %leave_type.name, max_days = leave_type.max_days, "Leave type created");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "leaveType": leave_type,
    })))
}

#[utoipa::path(
    put,
    path = "/leave-types/{id}",
    params(("id" = i64, Path, description = "Leave type id")),
    request_body = UpdateLeaveType,
    responses(
        (status = 200, description = "Leave type updated"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "LeaveType"
)]
pub async fn update_leave_type(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateLeaveType>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let mut leave_type = fetch_leave_type(pool.get_ref(), id).await?;

    if let Some(name) = &payload.name {
        leave_type.name = name.trim().to_string();
    }
    if let Some(description) = &payload.description {
        leave_type.description = description.clone();
    }
    if let Some(max_days) = payload.max_days {
        leave_type.max_days = max_days;
    }
    if let Some(requires_attachment) = payload.requires_attachment {
        leave_type.requires_attachment = requires_attachment;
    }

    sqlx::query(
        "UPDATE leave_types SET name = ?, description = ?, max_days = ?, requires_attachment = ? WHERE id = ?",
    )
    .bind(&leave_type.name)
    .bind(&leave_type.description)
    .bind(leave_type.max_days)
    .bind(leave_type.requires_attachment)
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to edit leave type", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "leaveType": leave_type,
    })))
}

#[utoipa::path(
    delete,
    path = "/leave-types/{id}",
    params(("id" = i64, Path, description = "Leave type id")),
    responses(
        (status = 200, description = "Leave type deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "LeaveType"
)]
pub async fn delete_leave_type(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let leave_type = fetch_leave_type(pool.get_ref(), id).await?;

    sqlx::query("DELETE FROM leave_types WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to delete leave type", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave type deleted",
        "leaveType": leave_type,
    })))
}
