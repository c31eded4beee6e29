use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    /// Email of the authenticated user
    pub sub: String,
    pub exp: usize,
    pub jti: String,
}
