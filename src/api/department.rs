use crate::{
    auth::auth::AuthUser,
    errors::ApiError,
    model::department::{Department, DepartmentWithCount},
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Computer Science")]
    pub name: String,
    #[schema(example = "CSE")]
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub code: Option<String>,
}

async fn fetch_department(pool: &SqlitePool, id: i64) -> Result<Department, ApiError> {
    sqlx::query_as::<_, Department>("SELECT id, name, code FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch department", e))?
        .ok_or_else(|| ApiError::NotFound("Department not found".to_string()))
}

/// Public listing; employee counts are computed per request by matching
/// `users.department` against the code case-insensitively.
#[utoipa::path(
    get,
    path = "/departments",
    responses((status = 200, description = "All departments with employee counts")),
    tag = "Department"
)]
pub async fn list_departments(pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let departments = sqlx::query_as::<_, DepartmentWithCount>(
        r#"
        SELECT
            d.id,
            d.name,
            d.code,
            (SELECT COUNT(*) FROM users u WHERE LOWER(u.department) = LOWER(d.code)) AS employees
        FROM departments d
        ORDER BY d.name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to fetch departments", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "departments": departments,
    })))
}

#[utoipa::path(
    post,
    path = "/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Department code already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateDepartment>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() || payload.code.trim().is_empty() {
        return Err(ApiError::Validation("Name & code required".to_string()));
    }

    let code = payload.code.trim().to_uppercase();

    let result = sqlx::query("INSERT INTO departments (name, code) VALUES (?, ?)")
        .bind(payload.name.trim())
        .bind(&code)
        .execute(pool.get_ref())
        .await;

    let result = match result {
        Ok(r) => r,
        Err(sqlx::Error::Database(db_err))
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            return Err(ApiError::Conflict(
                "Department code already exists".to_string(),
            ));
        }
        Err(e) => return Err(ApiError::internal("Failed to add department", e)),
    };

    let department = fetch_department(pool.get_ref(), result.last_insert_rowid()).await?;

    info!(code = %department.code, "Department created");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "department": department,
    })))
}

#[utoipa::path(
    put,
    path = "/departments/{id}",
    params(("id" = i64, Path, description = "Department id")),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateDepartment>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let mut department = fetch_department(pool.get_ref(), id).await?;

    if let Some(name) = &payload.name {
        department.name = name.trim().to_string();
    }
    if let Some(code) = &payload.code {
        department.code = code.trim().to_uppercase();
    }

    sqlx::query("UPDATE departments SET name = ?, code = ? WHERE id = ?")
        .bind(&department.name)
        .bind(&department.code)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to edit department", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "department": department,
    })))
}

#[utoipa::path(
    delete,
    path = "/departments/{id}",
    params(("id" = i64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let department = fetch_department(pool.get_ref(), id).await?;

    sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to delete department", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Department deleted",
        "department": department,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::{insert_user, peer, test_app, test_pool, token_for};
    use actix_web::cookie::Cookie;
    use actix_web::test;

    #[actix_web::test]
    async fn mutations_require_admin() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let user_id = insert_user(&pool, "Asha Verma", "asha@college.edu", "cse").await;
        let app = test_app!(pool, config);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/departments")
                .peer_addr(peer())
                .cookie(Cookie::new("token", token_for(&config, user_id, "asha@college.edu")))
                .set_json(json!({"name": "Computer Science", "code": "cse"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 403);
    }

    #[actix_web::test]
    async fn employee_count_matches_code_case_insensitively() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let admin_id = insert_user(&pool, "The Admin", "admin@college.edu", "it").await;
        insert_user(&pool, "Asha Verma", "asha@college.edu", "cse").await;
        insert_user(&pool, "Bala Iyer", "bala@college.edu", "cse").await;
        let app = test_app!(pool, config);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/departments")
                .peer_addr(peer())
                .cookie(Cookie::new("token", token_for(&config, admin_id, "admin@college.edu")))
                .set_json(json!({"name": "Computer Science", "code": "cse"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 201);
        let body: serde_json::Value = test::read_body_json(resp).await;
        // Stored uppercase even when submitted lowercase
        assert_eq!(body["department"]["code"], json!("CSE"));

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/departments")
                .peer_addr(peer())
                .to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["departments"][0]["employees"], json!(2));
    }

    #[actix_web::test]
    async fn duplicate_code_conflicts() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let admin_id = insert_user(&pool, "The Admin", "admin@college.edu", "it").await;
        let app = test_app!(pool, config);
        let cookie = Cookie::new("token", token_for(&config, admin_id, "admin@college.edu"));

        for expected in [201, 409] {
            let resp = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/departments")
                    .peer_addr(peer())
                    .cookie(cookie.clone())
                    .set_json(json!({"name": "Computer Science", "code": "CSE"}))
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), expected);
        }
    }

    #[actix_web::test]
    async fn update_and_delete_handle_missing_ids() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let admin_id = insert_user(&pool, "The Admin", "admin@college.edu", "it").await;
        let app = test_app!(pool, config);
        let cookie = Cookie::new("token", token_for(&config, admin_id, "admin@college.edu"));

        let resp = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/departments/999")
                .peer_addr(peer())
                .cookie(cookie.clone())
                .set_json(json!({"name": "Renamed"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 404);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/departments/999")
                .peer_addr(peer())
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 404);
    }
}
