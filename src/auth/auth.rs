use crate::auth::jwt;
use crate::config::Config;
use crate::errors::ApiError;
use crate::model::user::User;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::LocalBoxFuture;
use sqlx::SqlitePool;

pub const TOKEN_COOKIE: &str = "token";

/// Authenticated caller, resolved freshly from the store on every request so
/// that tokens for deleted accounts stop working immediately.
pub struct AuthUser {
    pub user: User,
    /// Derived: caller's email matches the configured admin email
    pub is_admin: bool,
}

/// Cookie-carried token takes priority over the Authorization header.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let config = req
                .app_data::<Data<Config>>()
                .cloned()
                .ok_or_else(|| ApiError::internal("App data missing", "no Data<Config>"))?;
            let pool = req
                .app_data::<Data<SqlitePool>>()
                .cloned()
                .ok_or_else(|| ApiError::internal("App data missing", "no Data<SqlitePool>"))?;

            let token = token_from_request(&req)
                .ok_or_else(|| ApiError::Auth("Please log in".to_string()))?;

            let claims = jwt::verify_token(&token, &config.jwt_secret)
                .map_err(|_| ApiError::Auth("Invalid or expired token. Please log in".to_string()))?;

            let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
                .bind(claims.user_id)
                .fetch_optional(pool.get_ref())
                .await
                .map_err(|e| ApiError::internal("Failed to load user for token", e))?
                .ok_or_else(|| {
                    ApiError::Auth("Invalid or expired token. Please log in".to_string())
                })?;

            let is_admin = config.is_admin_email(&user.email);

            Ok(AuthUser { user, is_admin })
        })
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You are not authorized as admin".to_string(),
            ))
        }
    }
}
