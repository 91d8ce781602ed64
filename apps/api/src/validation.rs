//! Request field checks shared by the profile, referral and discussion handlers.

use crate::errors::AppError;

/// Accepts `local@domain.tld`: exactly one `@`, a non-empty local part, a
/// domain with an inner dot, and no whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot < domain.len() - 1,
        None => false,
    }
}

pub fn require_email(field: &str, email: &str) -> Result<String, AppError> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(AppError::Validation(format!(
            "{field} must be a valid email address"
        )));
    }
    Ok(email.to_string())
}

/// Returns the trimmed value, or a validation error if nothing is left.
pub fn require_non_empty(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

pub fn require_graduation_year(year: i32) -> Result<i32, AppError> {
    if (1950..=2100).contains(&year) {
        Ok(year)
    } else {
        Err(AppError::Validation(format!(
            "graduationYear {year} is out of range"
        )))
    }
}
