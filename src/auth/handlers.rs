use crate::{
    auth::{
        auth::{AuthUser, TOKEN_COOKIE},
        jwt, password,
    },
    config::Config,
    errors::ApiError,
    mail::Mailer,
    model::user::User,
    utils::validation,
};
use actix_web::{
    HttpResponse,
    cookie::{Cookie, SameSite, time::Duration},
    web,
};
use chrono::Utc;
use rand::RngCore;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[schema(example = "Asha Verma")]
    pub full_name: String,
    #[schema(example = "asha@college.edu", format = "email")]
    pub email: String,
    #[schema(example = "9876543210")]
    pub phone_no: String,
    #[schema(example = 34)]
    pub age: i64,
    #[schema(example = "female")]
    pub gender: String,
    #[schema(example = "cse")]
    pub department: String,
    #[schema(example = json!(["algorithms"]))]
    pub subjects: Vec<String>,
    pub password: String,
    pub photo_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "asha@college.edu", format = "email")]
    pub email: String,
    pub password: String,
    /// "admin" requests the admin role; anything else is a regular login
    #[schema(example = "employee")]
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[schema(example = "asha@college.edu", format = "email")]
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// 7-day session cookie; Secure + cross-site-restricted in production only.
fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token)
        .http_only(true)
        .secure(config.production)
        .same_site(if config.production {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .path("/")
        .max_age(Duration::seconds(config.token_ttl as i64))
        .finish()
}

async fn fetch_user_by_id(pool: &SqlitePool, id: i64) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch user", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered, session cookie set"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
pub async fn signup(
    payload: web::Json<SignupRequest>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    validation::validate_signup(&payload)?;

    let hashed = password::hash_password(&payload.password)
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;
    let subjects = serde_json::to_string(&payload.subjects)
        .map_err(|e| ApiError::internal("Failed to encode subjects", e))?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (full_name, email, phone_no, age, gender, department, subjects, password, photo_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.full_name.trim())
    .bind(&payload.email)
    .bind(&payload.phone_no)
    .bind(payload.age)
    .bind(&payload.gender)
    .bind(&payload.department)
    .bind(&subjects)
    .bind(&hashed)
    .bind(&payload.photo_url)
    .execute(pool.get_ref())
    .await;

    let result = match result {
        Ok(r) => r,
        Err(sqlx::Error::Database(db_err))
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
        Err(e) => return Err(ApiError::internal("Failed to register user", e)),
    };

    let user = fetch_user_by_id(pool.get_ref(), result.last_insert_rowid()).await?;

    let token = jwt::generate_token(user.id, user.email.clone(), &config.jwt_secret, config.token_ttl)
        .map_err(|e| ApiError::internal("Failed to sign session token", e))?;

    info!(user_id = user.id, "User registered");

    Ok(HttpResponse::Created()
        .cookie(session_cookie(&config, token))
        .json(json!({
            "success": true,
            "message": "User registered successfully",
            "user": user.to_public(),
        })))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Admin role requested by non-admin account")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(payload, pool, config), fields(email = %payload.email))]
pub async fn login(
    payload: web::Json<LoginRequest>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    // Unknown email and bad password produce the same response so the
    // endpoint never reveals whether an account exists.
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch user for login", e))?
        .ok_or_else(|| ApiError::Auth("Invalid credentials".to_string()))?;

    password::verify_password(&payload.password, &user.password)
        .map_err(|_| ApiError::Auth("Invalid credentials".to_string()))?;

    // Role gate only after the credentials are confirmed valid
    if payload.role.as_deref() == Some("admin") && !config.is_admin_email(&user.email) {
        return Err(ApiError::Forbidden(
            "You are not authorized as admin".to_string(),
        ));
    }

    let token = jwt::generate_token(user.id, user.email.clone(), &config.jwt_secret, config.token_ttl)
        .map_err(|e| ApiError::internal("Failed to sign session token", e))?;

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&config, token))
        .json(json!({
            "success": true,
            "message": "Login successful",
            "user": user.to_public(),
        })))
}

#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "Current user with derived admin flag"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn current_user(auth: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": auth.user.to_public(),
        "isAdmin": auth.is_admin,
    })))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Session cookie cleared")),
    tag = "Auth"
)]
pub async fn logout(config: web::Data<Config>) -> Result<HttpResponse, ApiError> {
    // No server-side revocation list; the client is told to discard the
    // cookie and the token ages out naturally.
    let mut cookie = session_cookie(&config, String::new());
    cookie.make_removal();

    Ok(HttpResponse::Ok().cookie(cookie).json(json!({
        "success": true,
        "message": "Logout successful",
    })))
}

#[utoipa::path(
    post,
    path = "/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Generic acknowledgement, sent whether or not the email exists")
    ),
    tag = "Auth"
)]
pub async fn forgot_password(
    payload: web::Json<ForgotPasswordRequest>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    mailer: web::Data<Mailer>,
) -> Result<HttpResponse, ApiError> {
    let generic = json!({
        "success": true,
        "message": "If an account exists for that email, a reset link has been sent",
    });

    let user_id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to look up email for reset", e))?;

    let Some(user_id) = user_id else {
        return Ok(HttpResponse::Ok().json(generic));
    };

    // Single-use 256-bit token; only its digest is persisted
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw_token = hex::encode(bytes);
    let digest = hex::encode(Sha256::digest(raw_token.as_bytes()));
    let expires =
        Utc::now().naive_utc() + chrono::Duration::minutes(config.reset_token_ttl_minutes);

    sqlx::query("UPDATE users SET reset_token_hash = ?, reset_token_expires = ? WHERE id = ?")
        .bind(&digest)
        .bind(expires)
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| ApiError::internal("Failed to store reset token", e))?;

    let link = format!("{}/reset-password/{}", config.frontend_url, raw_token);

    // The digest is already persisted; a dispatch failure is logged but the
    // response stays generic so the endpoint can't be used for enumeration.
    if let Err(e) = mailer
        .send_password_reset(&payload.email, &link, config.reset_token_ttl_minutes)
        .await
    {
        error!(error = %e, user_id, "Failed to dispatch password reset email");
    }

    Ok(HttpResponse::Ok().json(generic))
}

#[utoipa::path(
    post,
    path = "/reset-password/{token}",
    params(("token" = String, Path, description = "Raw reset token from the emailed link")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced, token cleared"),
        (status = 400, description = "New password too weak"),
        (status = 401, description = "Invalid or expired token")
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    path: web::Path<String>,
    payload: web::Json<ResetPasswordRequest>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    if !validation::is_strong_password(&payload.password) {
        return Err(ApiError::Validation(
            "Password must be strong (min 8 chars, include uppercase, lowercase, number, and symbol)"
                .to_string(),
        ));
    }

    let digest = hex::encode(Sha256::digest(path.into_inner().as_bytes()));
    let now = Utc::now().naive_utc();

    let user_id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM users WHERE reset_token_hash = ? AND reset_token_expires > ?",
    )
    .bind(&digest)
    .bind(now)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to look up reset token", e))?
    .ok_or_else(|| ApiError::Auth("Invalid or expired token".to_string()))?;

    let hashed = password::hash_password(&payload.password)
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;

    sqlx::query(
        "UPDATE users SET password = ?, reset_token_hash = NULL, reset_token_expires = NULL WHERE id = ?",
    )
    .bind(&hashed)
    .bind(user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| ApiError::internal("Failed to update password", e))?;

    info!(user_id, "Password reset completed");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password reset successful",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_user, peer, test_app, test_pool, token_for};
    use actix_web::test;

    fn signup_body() -> serde_json::Value {
        json!({
            "fullName": "Asha Verma",
            "email": "asha@college.edu",
            "phoneNo": "9876543210",
            "age": 34,
            "gender": "female",
            "department": "cse",
            "subjects": ["algorithms"],
            "password": "Secret#123"
        })
    }

    #[actix_web::test]
    async fn signup_stores_hash_not_plaintext() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let app = test_app!(pool, config);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/signup")
                .peer_addr(peer())
                .set_json(signup_body())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 201);
        assert!(
            resp.headers().get("set-cookie").is_some(),
            "session cookie missing"
        );

        let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE email = ?")
            .bind("asha@college.edu")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_ne!(stored, "Secret#123");
    }

    #[actix_web::test]
    async fn signup_rejects_duplicate_email() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let app = test_app!(pool, config);

        for expected in [201, 409] {
            let resp = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/signup")
                    .peer_addr(peer())
                    .set_json(signup_body())
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), expected);
        }
    }

    #[actix_web::test]
    async fn signup_rejects_invalid_fields() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let app = test_app!(pool, config);

        let mut body = signup_body();
        body["password"] = json!("weak");
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/signup")
                .peer_addr(peer())
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn login_does_not_reveal_whether_email_exists() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        insert_user(&pool, "Asha Verma", "asha@college.edu", "cse").await;
        let app = test_app!(pool, config);

        let wrong_password = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .peer_addr(peer())
                .set_json(json!({"email": "asha@college.edu", "password": "Wrong#123"}))
                .to_request(),
        )
        .await;
        assert_eq!(wrong_password.status(), 401);
        let body_a = test::read_body(wrong_password).await;

        let unknown_email = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .peer_addr(peer())
                .set_json(json!({"email": "ghost@college.edu", "password": "Wrong#123"}))
                .to_request(),
        )
        .await;
        assert_eq!(unknown_email.status(), 401);
        let body_b = test::read_body(unknown_email).await;

        assert_eq!(body_a, body_b);
    }

    #[actix_web::test]
    async fn admin_role_login_is_gated_by_configured_email() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        insert_user(&pool, "Asha Verma", "asha@college.edu", "cse").await;
        insert_user(&pool, "The Admin", "admin@college.edu", "cse").await;
        let app = test_app!(pool, config);

        let denied = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .peer_addr(peer())
                .set_json(
                    json!({"email": "asha@college.edu", "password": "Secret#123", "role": "admin"}),
                )
                .to_request(),
        )
        .await;
        assert_eq!(denied.status(), 403);

        let granted = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .peer_addr(peer())
                .set_json(
                    json!({"email": "admin@college.edu", "password": "Secret#123", "role": "admin"}),
                )
                .to_request(),
        )
        .await;
        assert_eq!(granted.status(), 200);
    }

    #[actix_web::test]
    async fn current_user_reports_derived_admin_flag() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let user_id = insert_user(&pool, "Asha Verma", "asha@college.edu", "cse").await;
        let admin_id = insert_user(&pool, "The Admin", "admin@college.edu", "cse").await;
        let app = test_app!(pool, config);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/user")
                .peer_addr(peer())
                .cookie(Cookie::new("token", token_for(&config, user_id, "asha@college.edu")))
                .to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["isAdmin"], json!(false));
        assert!(body["user"].get("password").is_none());

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/user")
                .peer_addr(peer())
                .cookie(Cookie::new("token", token_for(&config, admin_id, "admin@college.edu")))
                .to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["isAdmin"], json!(true));
    }

    #[actix_web::test]
    async fn unauthenticated_user_request_is_rejected() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let app = test_app!(pool, config);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/user")
                .peer_addr(peer())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn forgot_password_response_is_generic_either_way() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        insert_user(&pool, "Asha Verma", "asha@college.edu", "cse").await;
        let app = test_app!(pool, config);

        let mut bodies = Vec::new();
        for email in ["asha@college.edu", "ghost@college.edu"] {
            let resp = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/forgot-password")
                    .peer_addr(peer())
                    .set_json(json!({"email": email}))
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), 200);
            bodies.push(test::read_body(resp).await);
        }
        assert_eq!(bodies[0], bodies[1]);

        let digest: Option<String> =
            sqlx::query_scalar("SELECT reset_token_hash FROM users WHERE email = ?")
                .bind("asha@college.edu")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(digest.is_some(), "reset digest was not persisted");
    }

    #[actix_web::test]
    async fn reset_password_replaces_hash_and_clears_token() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let user_id = insert_user(&pool, "Asha Verma", "asha@college.edu", "cse").await;
        let app = test_app!(pool, config);

        // Seed a known reset token the way forgot-password would
        let raw_token = "ab".repeat(32);
        let digest = hex::encode(Sha256::digest(raw_token.as_bytes()));
        let expires = Utc::now().naive_utc() + chrono::Duration::minutes(15);
        sqlx::query("UPDATE users SET reset_token_hash = ?, reset_token_expires = ? WHERE id = ?")
            .bind(&digest)
            .bind(expires)
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/reset-password/{raw_token}"))
                .peer_addr(peer())
                .set_json(json!({"password": "NewSecret#9"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 200);

        let login = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .peer_addr(peer())
                .set_json(json!({"email": "asha@college.edu", "password": "NewSecret#9"}))
                .to_request(),
        )
        .await;
        assert_eq!(login.status(), 200);

        // Token is single-use
        let again = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/reset-password/{raw_token}"))
                .peer_addr(peer())
                .set_json(json!({"password": "NewSecret#9"}))
                .to_request(),
        )
        .await;
        assert_eq!(again.status(), 401);
    }

    #[actix_web::test]
    async fn expired_reset_token_is_rejected() {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let user_id = insert_user(&pool, "Asha Verma", "asha@college.edu", "cse").await;
        let app = test_app!(pool, config);

        let raw_token = "cd".repeat(32);
        let digest = hex::encode(Sha256::digest(raw_token.as_bytes()));
        let expires = Utc::now().naive_utc() - chrono::Duration::minutes(1);
        sqlx::query("UPDATE users SET reset_token_hash = ?, reset_token_expires = ? WHERE id = ?")
            .bind(&digest)
            .bind(expires)
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/reset-password/{raw_token}"))
                .peer_addr(peer())
                .set_json(json!({"password": "NewSecret#9"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 401);
    }
}
