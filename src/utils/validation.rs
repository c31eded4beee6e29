use crate::auth::handlers::SignupRequest;
use crate::errors::ApiError;

const VALID_GENDERS: &[&str] = &["male", "female", "others"];
const VALID_DEPARTMENTS: &[&str] = &["cse", "it", "ece"];

/// 10 digits, starting 6-9
fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10
        && phone.chars().all(|c| c.is_ascii_digit())
        && matches!(phone.chars().next(), Some('6'..='9'))
}

/// Min 8 chars with at least one uppercase, lowercase, digit and symbol.
pub fn is_strong_password(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric())
}

pub fn validate_signup(data: &SignupRequest) -> Result<(), ApiError> {
    let full_name = data.full_name.trim();
    if full_name.len() < 3 || full_name.len() > 50 {
        return Err(ApiError::Validation(
            "Full name must be 3-50 characters long".to_string(),
        ));
    }

    if !is_valid_phone(&data.phone_no) {
        return Err(ApiError::Validation(
            "Invalid phone number format".to_string(),
        ));
    }

    if !validator::validate_email(&data.email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    if data.age < 18 || data.age > 100 {
        return Err(ApiError::Validation(
            "Age must be between 18 and 100".to_string(),
        ));
    }

    if !VALID_GENDERS.contains(&data.gender.as_str()) {
        return Err(ApiError::Validation(
            "Gender must be male, female, or others".to_string(),
        ));
    }

    if !VALID_DEPARTMENTS.contains(&data.department.as_str()) {
        return Err(ApiError::Validation(
            "Department must be cse, it, or ece".to_string(),
        ));
    }

    if data.subjects.is_empty() {
        return Err(ApiError::Validation(
            "At least one subject must be provided".to_string(),
        ));
    }
    if data.subjects.iter().any(|s| s.trim().len() < 2) {
        return Err(ApiError::Validation(
            "Each subject must be a valid string (min 2 chars)".to_string(),
        ));
    }

    if !is_strong_password(&data.password) {
        return Err(ApiError::Validation(
            "Password must be strong (min 8 chars, include uppercase, lowercase, number, and symbol)"
                .to_string(),
        ));
    }

    Ok(())
}
