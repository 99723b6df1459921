use crate::types::{
    RequestCreateInput, RequestSubmission, RequestType, RequestUpdateInput,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Minimum length for a request description (after trimming).
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Maximum size for a request description (bytes).
pub const MAX_DESCRIPTION_LEN: usize = 10 * 1024;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// A field-level validation failure, returned to the client verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validates a raw submission and produces the typed storage input.
///
/// The caller has already established that `user_id` and `user_email` are
/// present; this re-checks them so the function is safe to call on its own.
pub fn validate_submission(
    data: &RequestSubmission,
) -> Result<RequestCreateInput, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let user_id = data.user_id.as_deref().unwrap_or("").trim().to_string();
    if user_id.is_empty() {
        errors.push(ValidationError::new("userId", "User ID is required"));
    }

    let user_email = data.user_email.as_deref().unwrap_or("").trim().to_string();
    if user_email.is_empty() {
        errors.push(ValidationError::new("userEmail", "User email is required"));
    } else if !EMAIL_RE.is_match(&user_email) {
        errors.push(ValidationError::new(
            "userEmail",
            format!("Invalid email address: {}", user_email),
        ));
    }

    let request_type = match data.request_type.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(ValidationError::new("requestType", "Request type is required"));
            None
        }
        Some(raw) => match RequestType::parse(raw) {
            Some(t) => Some(t),
            None => {
                errors.push(ValidationError::new(
                    "requestType",
                    format!("Unknown request type: {}", raw),
                ));
                None
            }
        },
    };

    let description = data.description.as_deref().unwrap_or("").trim().to_string();
    if let Some(error) = check_description(&description, true) {
        errors.push(error);
    }

    for goal in &data.goals {
        if goal.trim().is_empty() {
            errors.push(ValidationError::new("goals", "Goals cannot be empty"));
            break;
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(RequestCreateInput {
        user_id,
        user_email,
        request_type: request_type.expect("validated above"),
        description,
        goals: data.goals.clone(),
        current_lead_gen: data.current_lead_gen.clone(),
        estimated_delivery: data.estimated_delivery,
    })
}

/// Validates a general update patch.
pub fn validate_request_update(updates: &RequestUpdateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(ref description) = updates.description {
        if let Some(error) = check_description(description.trim(), true) {
            errors.push(error);
        }
    }

    if let Some(ref goals) = updates.goals {
        for goal in goals {
            if goal.trim().is_empty() {
                errors.push(ValidationError::new("goals", "Goals cannot be empty"));
                break;
            }
        }
    }

    errors
}

/// Returns the name of the first immutable field an update tries to touch.
pub fn immutable_field_attempt(updates: &RequestUpdateInput) -> Option<&'static str> {
    if updates.id.is_some() {
        Some("id")
    } else if updates.user_id.is_some() {
        Some("userId")
    } else if updates.user_email.is_some() {
        Some("userEmail")
    } else if updates.created_at.is_some() {
        Some("createdAt")
    } else {
        None
    }
}

fn check_description(trimmed: &str, required: bool) -> Option<ValidationError> {
    if trimmed.is_empty() {
        if required {
            return Some(ValidationError::new("description", "Description is required"));
        }
        return None;
    }

    if trimmed.len() < MIN_DESCRIPTION_LEN {
        return Some(ValidationError::new(
            "description",
            format!(
                "Description is too short (minimum {} characters, got {})",
                MIN_DESCRIPTION_LEN,
                trimmed.len()
            ),
        ));
    }

    if trimmed.len() > MAX_DESCRIPTION_LEN {
        return Some(ValidationError::new(
            "description",
            format!(
                "Description exceeds maximum size of {} bytes (got {})",
                MAX_DESCRIPTION_LEN,
                trimmed.len()
            ),
        ));
    }

    if trimmed.contains('\0') {
        return Some(ValidationError::new(
            "description",
            "Description contains invalid null bytes",
        ));
    }

    None
}
