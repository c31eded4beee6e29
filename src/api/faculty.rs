use crate::{auth::auth::AuthUser, config::Config, errors::ApiError, model::user::User};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct FacultyFilter {
    /// Department code, matched case-insensitively
    pub department: Option<String>,
    pub gender: Option<String>,
    /// Matched against the faculty member's subject list
    pub subject: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct FacultyLoadQuery {
    pub school: Option<String>,
    pub department: Option<String>,
}

#[utoipa::path(
    get,
    path = "/faculties",
    params(FacultyFilter),
    responses(
        (status = 200, description = "Matching faculty, sorted by name"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No faculties found")
    ),
    security(("bearer_auth" = [])),
    tag = "Faculty"
)]
pub async fn list_faculties(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<FacultyFilter>,
) -> Result<HttpResponse, ApiError> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let Some(department) = &query.department {
        where_sql.push_str(" AND LOWER(department) = ?");
        args.push(department.to_lowercase());
    }
    if let Some(gender) = &query.gender {
        where_sql.push_str(" AND LOWER(gender) = ?");
        args.push(gender.to_lowercase());
    }

    let sql = format!("SELECT * FROM users{where_sql} ORDER BY full_name");

    let mut q = sqlx::query_as::<_, User>(&sql);
    for arg in &args {
        q = q.bind(arg);
    }

    let users = q
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch faculty list", e))?;

    // The subject filter matches membership in the JSON-encoded subject
    // list, so it is applied after the fetch.
    let faculties: Vec<_> = users
        .iter()
        .filter(|u| match &query.subject {
            Some(subject) => {
                let wanted = subject.to_lowercase();
                u.subject_list().iter().any(|s| s.to_lowercase() == wanted)
            }
            None => true,
        })
        .map(|u| u.to_public())
        .collect();

    if faculties.is_empty() {
        return Err(ApiError::NotFound("No faculties found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": faculties.len(),
        "faculties": faculties,
    })))
}

#[utoipa::path(
    delete,
    path = "/faculty/{id}",
    params(("id" = i64, Path, description = "Faculty user id")),
    responses(
        (status = 200, description = "Faculty deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Faculty not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Faculty"
)]
pub async fn delete_faculty(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch faculty", e))?
        .ok_or_else(|| ApiError::NotFound("Faculty not found.".to_string()))?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to delete faculty", e))?;

    info!(faculty_id = id, "Faculty deleted");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Faculty deleted successfully.",
        "deletedFaculty": {
            "id": user.id,
            "fullName": user.full_name,
            "email": user.email,
        },
    })))
}

/// Passthrough proxy for the external schedule page. No auth; the upstream
/// response body is returned as-is, with a bounded wait enforced by the
/// shared client's timeout.
#[utoipa::path(
    get,
    path = "/faculty-load",
    params(FacultyLoadQuery),
    responses(
        (status = 200, description = "Upstream schedule HTML"),
        (status = 500, description = "Upstream fetch failed or timed out")
    ),
    tag = "Faculty"
)]
pub async fn faculty_load(
    query: web::Query<FacultyLoadQuery>,
    client: web::Data<reqwest::Client>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let mut params: Vec<(&str, &str)> = Vec::new();
    if let Some(school) = &query.school {
        params.push(("school", school));
    }
    if let Some(department) = &query.department {
        params.push(("department", department));
    }

    let response = client
        .get(&config.schedule_url)
        .query(&params)
        .send()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch faculty load page", e))?;

    let body = response
        .text()
        .await
        .map_err(|e| ApiError::internal("Failed to read faculty load page", e))?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}
