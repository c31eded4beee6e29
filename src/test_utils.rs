//! Shared fixtures for the in-process integration tests. Everything runs
//! against an in-memory SQLite database; the pool is capped at a single
//! connection so every query sees the same database.

use crate::auth::{jwt, password};
use crate::config::Config;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;

pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    crate::db::init_schema(&pool).await.expect("schema");
    pool
}

/// The rate limiter keys on peer IP and errors out without one, so every
/// TestRequest must carry a peer address.
pub fn peer() -> SocketAddr {
    "127.0.0.1:9000".parse().unwrap()
}

/// Inserts a user with a fixed profile and the password "Secret#123",
/// returning the new row id.
pub async fn insert_user(pool: &SqlitePool, full_name: &str, email: &str, department: &str) -> i64 {
    let hash = password::hash_password("Secret#123").unwrap();
    sqlx::query(
        r#"
        INSERT INTO users (full_name, email, password, phone_no, age, gender, department, subjects)
        VALUES (?, ?, ?, '9876543210', 30, 'female', ?, '["algorithms"]')
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(hash)
    .bind(department)
    .execute(pool)
    .await
    .expect("insert user")
    .last_insert_rowid()
}

pub async fn insert_leave_type(pool: &SqlitePool, name: &str, max_days: i64) -> i64 {
    sqlx::query("INSERT INTO leave_types (name, description, max_days) VALUES (?, '', ?)")
        .bind(name)
        .bind(max_days)
        .execute(pool)
        .await
        .expect("insert leave type")
        .last_insert_rowid()
}

pub fn token_for(config: &Config, user_id: i64, email: &str) -> String {
    jwt::generate_token(user_id, email.to_string(), &config.jwt_secret, config.token_ttl)
        .expect("token")
}

/// Builds the full application the way `main` does, minus the listener:
/// same routes, extractors, limiter and app data.
macro_rules! test_app {
    ($pool:expr, $config:expr) => {{
        let config = $config.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($pool.clone()))
                .app_data(actix_web::web::Data::new(config.clone()))
                .app_data(actix_web::web::Data::new(crate::mail::Mailer::disabled()))
                .app_data(actix_web::web::Data::new(reqwest::Client::new()))
                .configure(move |cfg| crate::routes::configure(cfg, &config)),
        )
        .await
    }};
}

pub(crate) use test_app;
