use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub admin_email: String,
    pub frontend_url: String,

    /// Session token lifetime in seconds (default 7 days)
    pub token_ttl: usize,
    /// Password-reset token lifetime in minutes (default 15)
    pub reset_token_ttl_minutes: i64,

    // Mail collaborator; the mailer degrades to logging when any are unset
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub mail_from: String,

    /// Base URL of the external schedule page proxied by /faculty-load
    pub schedule_url: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_signup_per_min: u32,
    pub rate_protected_per_min: u32,

    /// Controls cookie Secure/SameSite attributes
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:2713".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://flms.db".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            admin_email: env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL must be set"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            token_ttl: env::var("TOKEN_TTL")
                .unwrap_or_else(|_| "604800".to_string()) // 7 days
                .parse()
                .expect("TOKEN_TTL must be a number of seconds"),
            reset_token_ttl_minutes: env::var("RESET_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .expect("RESET_TOKEN_TTL_MINUTES must be a number of minutes"),

            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "FLMS <no-reply@flms.local>".to_string()),

            schedule_url: env::var("SCHEDULE_URL")
                .unwrap_or_else(|_| "https://webprosindia.com/vignanit/Default.aspx".to_string()),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            rate_signup_per_min: env::var("RATE_SIGNUP_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),

            production: env::var("APP_ENV")
                .map(|v| v == "production")
                .unwrap_or(false),
        }
    }

    /// Derived role check. Admin-ness is recomputed from configuration on
    /// every call, never stored on the user record.
    pub fn is_admin_email(&self, email: &str) -> bool {
        email == self.admin_email
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            admin_email: "admin@college.edu".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            token_ttl: 3600,
            reset_token_ttl_minutes: 15,
            smtp_host: None,
            smtp_username: None,
            smtp_password: None,
            mail_from: "FLMS <no-reply@flms.local>".to_string(),
            schedule_url: "http://127.0.0.1:1/schedule".to_string(),
            rate_login_per_min: 60,
            rate_signup_per_min: 30,
            rate_protected_per_min: 1000,
            production: false,
        }
    }
}
