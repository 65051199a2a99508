use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError};

use super::question::DifficultyLevel;

/// Request to create a subject
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 2, message = "Subject Name is required"))]
    pub name: String,

    #[validate(length(min = 2, message = "Subject Code is required"))]
    pub code: String,

    #[validate(length(min = 2, message = "Description is required"))]
    pub description: String,

    #[validate(length(min = 2, message = "Color Code is required"))]
    pub color_code: String,
}

/// Request to update a subject
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 2, message = "Subject name is required"))]
    pub name: String,

    #[validate(length(min = 2, message = "Subject code is required"))]
    pub code: String,

    pub description: Option<String>,
    pub color_code: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
}

/// Request to create a topic under a subject
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTopicRequest {
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject_id: String,

    #[validate(length(min = 1, message = "Topic name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,

    #[validate(range(
        exclusive_min = 0.0,
        message = "Estimated time must be greater than zero"
    ))]
    pub estimated_time_minutes: f64,

    #[serde(default)]
    #[validate(custom(function = "url_or_empty"))]
    pub video_url: String,

    #[serde(default)]
    #[validate(custom(function = "url_or_empty"))]
    pub document_url: String,

    pub is_active: bool,
    pub difficulty_level: DifficultyLevel,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Request to update a topic
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateTopicRequest {
    #[validate(length(min = 1, message = "Topic name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,

    #[validate(range(
        exclusive_min = 0.0,
        message = "Estimated time must be greater than zero"
    ))]
    pub estimated_time_minutes: f64,

    /// Empty string means "no video".
    #[serde(default)]
    #[validate(custom(function = "url_or_empty"))]
    pub video_url: String,

    #[serde(default)]
    #[validate(custom(function = "url_or_empty"))]
    pub document_url: String,

    pub is_active: bool,
    pub difficulty_level: DifficultyLevel,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Request to create a role
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(custom(function = "role_name_length"))]
    pub name: String,

    #[validate(custom(function = "role_display_name_length"))]
    pub display_name: String,

    #[validate(custom(function = "role_description_length"))]
    pub description: String,

    #[validate(custom(function = "known_role_type"))]
    pub role_type: String,

    #[serde(default, deserialize_with = "permission_ids")]
    #[validate(custom(function = "all_uuids"))]
    pub permission_ids: Vec<String>,
}

/// Request to create a permission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PermissionRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Display Name is required"))]
    pub display_name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(length(min = 1, message = "Resource is required"))]
    pub resource: String,

    #[validate(length(min = 1, message = "Action is required"))]
    pub action: String,
}

/// Request to assign several permissions to a role at once
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkPermissionRequest {
    #[serde(default, deserialize_with = "permission_ids")]
    #[validate(custom(function = "all_uuids"))]
    pub permission_ids: Vec<String>,
}

const ROLE_TYPES: &[&str] = &["system", "custom"];

fn known_role_type(value: &str) -> Result<(), ValidationError> {
    if ROLE_TYPES.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("role_type").with_message(Cow::Borrowed(
            "Role type must be either 'system' or 'custom'",
        )))
    }
}

fn length_between(
    value: &str,
    min: usize,
    max: usize,
    too_short: &'static str,
    too_long: &'static str,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        Err(ValidationError::new("length").with_message(Cow::Borrowed(too_short)))
    } else if len > max {
        Err(ValidationError::new("length").with_message(Cow::Borrowed(too_long)))
    } else {
        Ok(())
    }
}

fn role_name_length(value: &str) -> Result<(), ValidationError> {
    length_between(
        value,
        2,
        50,
        "Role name must be at least 2 characters",
        "Role name must not exceed 50 characters",
    )
}

fn role_display_name_length(value: &str) -> Result<(), ValidationError> {
    length_between(
        value,
        2,
        100,
        "Display name must be at least 2 characters",
        "Display name must not exceed 100 characters",
    )
}

fn role_description_length(value: &str) -> Result<(), ValidationError> {
    length_between(
        value,
        5,
        255,
        "Description must be at least 5 characters",
        "Description must not exceed 255 characters",
    )
}

fn url_or_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message(Cow::Borrowed("Must be a valid URL")))
    }
}

fn all_uuids(ids: &[String]) -> Result<(), ValidationError> {
    if ids.iter().all(|id| Uuid::parse_str(id).is_ok()) {
        Ok(())
    } else {
        Err(ValidationError::new("uuid")
            .with_message(Cow::Borrowed("Each permission ID must be a valid UUID")))
    }
}

/// Accepts either a JSON array of ids or a comma-separated string.
/// Invalid ids are dropped from the string form only; the array form is
/// checked by validation instead.
fn permission_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::List(ids)) => ids,
        Some(Raw::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|id| Uuid::parse_str(id).is_ok())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    })
}
