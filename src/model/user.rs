use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Full user row, including credential fields. Never serialized directly.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone_no: String,
    pub age: i64,
    pub gender: String,
    pub department: String,
    /// JSON-encoded array of subject strings
    pub subjects: String,
    pub photo_url: Option<String>,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn subject_list(&self) -> Vec<String> {
        serde_json::from_str(&self.subjects).unwrap_or_default()
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone_no: self.phone_no.clone(),
            age: self.age,
            gender: self.gender.clone(),
            department: self.department.clone(),
            subjects: self.subject_list(),
            photo_url: self.photo_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Client-facing profile, credential and reset fields stripped.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Asha Verma")]
    pub full_name: String,
    #[schema(example = "asha@college.edu")]
    pub email: String,
    #[schema(example = "9876543210")]
    pub phone_no: String,
    #[schema(example = 34)]
    pub age: i64,
    #[schema(example = "female")]
    pub gender: String,
    #[schema(example = "cse")]
    pub department: String,
    #[schema(example = json!(["algorithms", "operating systems"]))]
    pub subjects: Vec<String>,
    pub photo_url: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
