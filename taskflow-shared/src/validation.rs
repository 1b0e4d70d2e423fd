/// Task payload validation
///
/// Pure functions that turn a raw JSON body into a typed, constrained task
/// payload or a [`ValidationFailure`] listing every offending field. Nothing
/// here touches storage.
///
/// Field names are the camelCase names clients send (`dueDate`,
/// `reminderTime`, ...). Keys outside the accepted set are rejected, one error
/// per unknown key.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use taskflow_shared::models::task::Priority;
/// use taskflow_shared::validation::validate_create;
///
/// let draft = validate_create(&json!({ "title": "  Buy milk  " })).unwrap();
/// assert_eq!(draft.title, "Buy milk");
/// assert_eq!(draft.priority, Priority::Medium);
///
/// let err = validate_create(&json!({ "title": "Buy milk", "priority": "urgent" })).unwrap_err();
/// assert!(err.mentions("priority"));
/// ```

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use crate::models::task::{Priority, TaskDraft, TaskPatch};

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum description length in characters
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

const CREATE_FIELDS: &[&str] = &[
    "title",
    "description",
    "priority",
    "dueDate",
    "reminderDate",
    "reminderTime",
];

const UPDATE_FIELDS: &[&str] = &[
    "title",
    "description",
    "priority",
    "dueDate",
    "reminderDate",
    "reminderTime",
    "completed",
];

/// A single field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field path (e.g. `title`, `email.smtpHost`)
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validation failed for one or more fields
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed: {} errors", .errors.len())]
pub struct ValidationFailure {
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    /// Single-field failure
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Returns true if any error refers to `field`
    pub fn mentions(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl From<validator::ValidationErrors> for ValidationFailure {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut collected = Vec::new();
        flatten_errors(None, &errors, &mut collected);
        collected.sort_by(|a, b| a.field.cmp(&b.field));
        Self { errors: collected }
    }
}

fn flatten_errors(
    prefix: Option<&str>,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let name = camel_case(field);
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name,
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string());
                    FieldError::new(path.clone(), message)
                }));
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(Some(&path), nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_errors(Some(&format!("{}[{}]", path, index)), nested, out);
                }
            }
        }
    }
}

/// Converts a snake_case Rust field name to the camelCase wire name
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Rejects strings that are empty after trimming or contain NUL characters
///
/// Usable as a `validator` custom rule.
pub fn storable_text(value: &str) -> Result<(), validator::ValidationError> {
    let (code, message) = if value.trim().is_empty() {
        ("blank", "Must not be empty")
    } else if value.contains('\0') {
        ("nul", "Must not contain NUL characters")
    } else {
        return Ok(());
    };

    let mut error = validator::ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    Err(error)
}

/// Validates a create payload
///
/// Requires a non-blank `title`; `priority` defaults to medium when omitted.
/// A `reminderTime` (`HH:MM`) is merged into `reminderDate`.
pub fn validate_create(input: &Value) -> Result<TaskDraft, ValidationFailure> {
    let object = as_object(input)?;
    let mut errors = unknown_fields(object, CREATE_FIELDS);

    let title = match object.get("title") {
        None | Some(Value::Null) => {
            errors.push(FieldError::new("title", "Title is required"));
            None
        }
        Some(value) => collect(&mut errors, parse_title(value)),
    };

    let description = collect(
        &mut errors,
        parse_nullable(object, "description", parse_description),
    )
    .flatten()
    .flatten();

    let priority = match object.get("priority") {
        None | Some(Value::Null) => Some(Priority::default()),
        Some(value) => collect(&mut errors, parse_priority(value)),
    };

    let due_date = collect(&mut errors, parse_nullable(object, "dueDate", parse_timestamp))
        .flatten()
        .flatten();
    let reminder_date = collect(
        &mut errors,
        parse_nullable(object, "reminderDate", parse_timestamp),
    )
    .flatten()
    .flatten();
    let reminder_time = collect(
        &mut errors,
        parse_nullable(object, "reminderTime", parse_time_of_day),
    )
    .flatten()
    .flatten();

    let reminder_date = match (reminder_date, reminder_time) {
        (Some(date), Some(time)) => Some(merge_time_of_day(date, time)),
        (None, Some(_)) => {
            errors.push(FieldError::new(
                "reminderTime",
                "Reminder time requires a reminder date",
            ));
            None
        }
        (date, None) => date,
    };

    if !errors.is_empty() {
        return Err(ValidationFailure { errors });
    }

    // Both are Some when no error was recorded
    match (title, priority) {
        (Some(title), Some(priority)) => Ok(TaskDraft {
            title,
            description,
            priority,
            due_date,
            reminder_date,
        }),
        _ => Err(ValidationFailure::field("title", "Title is required")),
    }
}

/// Validates an update payload
///
/// Any subset of the mutable fields may be present; an empty object is a valid
/// no-op patch. `null` clears `description`, `dueDate` and `reminderDate`.
pub fn validate_update(input: &Value) -> Result<TaskPatch, ValidationFailure> {
    let object = as_object(input)?;
    let mut errors = unknown_fields(object, UPDATE_FIELDS);
    let mut patch = TaskPatch::default();

    match object.get("title") {
        None => {}
        Some(Value::Null) => errors.push(FieldError::new("title", "Title cannot be null")),
        Some(value) => patch.title = collect(&mut errors, parse_title(value)),
    }

    patch.description = collect(
        &mut errors,
        parse_nullable(object, "description", parse_description),
    )
    .flatten();

    match object.get("priority") {
        None => {}
        Some(Value::Null) => errors.push(FieldError::new("priority", "Priority cannot be null")),
        Some(value) => patch.priority = collect(&mut errors, parse_priority(value)),
    }

    patch.due_date = collect(&mut errors, parse_nullable(object, "dueDate", parse_timestamp))
        .flatten();
    let reminder_date = collect(
        &mut errors,
        parse_nullable(object, "reminderDate", parse_timestamp),
    )
    .flatten();
    let reminder_time = collect(
        &mut errors,
        parse_nullable(object, "reminderTime", parse_time_of_day),
    )
    .flatten()
    .flatten();

    patch.reminder_date = match (reminder_date, reminder_time) {
        (Some(Some(date)), Some(time)) => Some(Some(merge_time_of_day(date, time))),
        (_, Some(_)) => {
            errors.push(FieldError::new(
                "reminderTime",
                "Reminder time requires a reminder date",
            ));
            None
        }
        (date, None) => date,
    };

    match object.get("completed") {
        None => {}
        Some(Value::Bool(completed)) => patch.completed = Some(*completed),
        Some(_) => errors.push(FieldError::new("completed", "Completed must be a boolean")),
    }

    if !errors.is_empty() {
        return Err(ValidationFailure { errors });
    }

    Ok(patch)
}

/// Merges a time-of-day into a date, in UTC
pub fn merge_time_of_day(date: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.date_naive().and_time(time))
}

fn as_object(input: &Value) -> Result<&Map<String, Value>, ValidationFailure> {
    input
        .as_object()
        .ok_or_else(|| ValidationFailure::field("body", "Expected a JSON object"))
}

fn unknown_fields(object: &Map<String, Value>, allowed: &[&str]) -> Vec<FieldError> {
    object
        .keys()
        .filter(|key| !allowed.contains(&key.as_str()))
        .map(|key| FieldError::new(key.as_str(), "Unknown field"))
        .collect()
}

fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            errors.push(error);
            None
        }
    }
}

/// Parses an optional, nullable field
///
/// Absent → `Ok(None)`, `null` → `Ok(Some(None))`, value → `Ok(Some(Some(v)))`.
fn parse_nullable<T>(
    object: &Map<String, Value>,
    field: &str,
    parse: fn(&str, &Value) -> Result<Option<T>, FieldError>,
) -> Result<Option<Option<T>>, FieldError> {
    match object.get(field) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(value) => parse(field, value).map(Some),
    }
}

fn parse_title(value: &Value) -> Result<String, FieldError> {
    let raw = value
        .as_str()
        .ok_or_else(|| FieldError::new("title", "Title must be a string"))?;
    let title = raw.trim();

    if title.is_empty() {
        return Err(FieldError::new("title", "Title must not be empty"));
    }
    if title.contains('\0') {
        return Err(FieldError::new("title", "Title must not contain NUL characters"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(FieldError::new(
            "title",
            format!("Title must be at most {} characters", MAX_TITLE_LENGTH),
        ));
    }

    Ok(title.to_string())
}

/// Blank descriptions normalize to `None`
fn parse_description(field: &str, value: &Value) -> Result<Option<String>, FieldError> {
    let raw = value
        .as_str()
        .ok_or_else(|| FieldError::new(field, "Description must be a string"))?;
    let description = raw.trim();

    if description.contains('\0') {
        return Err(FieldError::new(
            field,
            "Description must not contain NUL characters",
        ));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(FieldError::new(
            field,
            format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            ),
        ));
    }

    Ok((!description.is_empty()).then(|| description.to_string()))
}

fn parse_priority(value: &Value) -> Result<Priority, FieldError> {
    value
        .as_str()
        .ok_or_else(|| FieldError::new("priority", "Priority must be a string"))?
        .parse::<Priority>()
        .map_err(|message| FieldError::new("priority", message))
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC)
fn parse_timestamp(field: &str, value: &Value) -> Result<Option<DateTime<Utc>>, FieldError> {
    let raw = value
        .as_str()
        .ok_or_else(|| FieldError::new(field, "Expected an ISO 8601 date string"))?;

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))))
        .map_err(|_| FieldError::new(field, format!("Invalid date '{}'", raw)))
}

fn parse_time_of_day(field: &str, value: &Value) -> Result<Option<NaiveTime>, FieldError> {
    let raw = value
        .as_str()
        .ok_or_else(|| FieldError::new(field, "Expected a time in HH:MM format"))?;

    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(Some)
        .map_err(|_| FieldError::new(field, format!("Invalid time '{}', expected HH:MM", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_minimal_defaults_priority() {
        let draft = validate_create(&json!({ "title": "Buy milk" })).unwrap();

        assert_eq!(draft.title, "Buy milk");
        assert_eq!(draft.priority, Priority::Medium);
        assert!(draft.description.is_none());
        assert!(draft.due_date.is_none());
        assert!(draft.reminder_date.is_none());
    }

    #[test]
    fn test_create_trims_title() {
        let draft = validate_create(&json!({ "title": "  Call mom \n" })).unwrap();
        assert_eq!(draft.title, "Call mom");
    }

    #[test]
    fn test_create_whitespace_title_fails() {
        let err = validate_create(&json!({ "title": "   " })).unwrap_err();
        assert!(err.mentions("title"));
    }

    #[test]
    fn test_create_missing_title_fails() {
        let err = validate_create(&json!({ "priority": "high" })).unwrap_err();
        assert!(err.mentions("title"));
        assert_eq!(err.errors.len(), 1);
    }

    #[test]
    fn test_create_invalid_priority_fails() {
        let err = validate_create(&json!({ "title": "Buy milk", "priority": "urgent" })).unwrap_err();
        assert!(err.mentions("priority"));
        assert!(!err.mentions("title"));
    }

    #[test]
    fn test_create_collects_all_errors() {
        let err = validate_create(&json!({
            "title": "",
            "priority": 3,
            "dueDate": "tomorrow"
        }))
        .unwrap_err();

        assert!(err.mentions("title"));
        assert!(err.mentions("priority"));
        assert!(err.mentions("dueDate"));
    }

    #[test]
    fn test_create_rejects_unknown_fields() {
        let err = validate_create(&json!({ "title": "Buy milk", "userId": "someone" })).unwrap_err();
        assert!(err.mentions("userId"));

        let err = validate_create(&json!({ "title": "Buy milk", "completed": true })).unwrap_err();
        assert!(err.mentions("completed"));
    }

    #[test]
    fn test_create_rejects_non_object() {
        let err = validate_create(&json!(["title"])).unwrap_err();
        assert!(err.mentions("body"));
    }

    #[test]
    fn test_create_blank_description_is_absent() {
        let draft = validate_create(&json!({ "title": "A", "description": "   " })).unwrap();
        assert!(draft.description.is_none());
    }

    #[test]
    fn test_create_title_too_long() {
        let title = "x".repeat(MAX_TITLE_LENGTH + 1);
        let err = validate_create(&json!({ "title": title })).unwrap_err();
        assert!(err.mentions("title"));
    }

    #[test]
    fn test_create_parses_dates() {
        let draft = validate_create(&json!({
            "title": "Dentist",
            "dueDate": "2025-03-10T15:30:00+02:00",
            "reminderDate": "2025-03-09"
        }))
        .unwrap();

        assert_eq!(
            draft.due_date,
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 13, 30, 0).unwrap())
        );
        assert_eq!(
            draft.reminder_date,
            Some(Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_create_merges_reminder_time() {
        let draft = validate_create(&json!({
            "title": "Dentist",
            "reminderDate": "2025-03-09T00:00:00Z",
            "reminderTime": "08:45"
        }))
        .unwrap();

        assert_eq!(
            draft.reminder_date,
            Some(Utc.with_ymd_and_hms(2025, 3, 9, 8, 45, 0).unwrap())
        );
    }

    #[test]
    fn test_create_reminder_time_without_date_fails() {
        let err = validate_create(&json!({ "title": "A", "reminderTime": "08:45" })).unwrap_err();
        assert!(err.mentions("reminderTime"));
    }

    #[test]
    fn test_create_invalid_reminder_time_fails() {
        let err = validate_create(&json!({
            "title": "A",
            "reminderDate": "2025-03-09",
            "reminderTime": "25:99"
        }))
        .unwrap_err();
        assert!(err.mentions("reminderTime"));
    }

    #[test]
    fn test_update_empty_is_noop_patch() {
        let patch = validate_update(&json!({})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_update_partial_fields() {
        let patch = validate_update(&json!({ "completed": true, "priority": "low" })).unwrap();

        assert_eq!(patch.completed, Some(true));
        assert_eq!(patch.priority, Some(Priority::Low));
        assert!(patch.title.is_none());
        assert!(patch.description.is_none());
    }

    #[test]
    fn test_update_null_clears_nullable_fields() {
        let patch = validate_update(&json!({
            "description": null,
            "dueDate": null,
            "reminderDate": null
        }))
        .unwrap();

        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.reminder_date, Some(None));
    }

    #[test]
    fn test_update_rejects_blank_title_and_null_priority() {
        let err = validate_update(&json!({ "title": "  ", "priority": null })).unwrap_err();
        assert!(err.mentions("title"));
        assert!(err.mentions("priority"));
    }

    #[test]
    fn test_update_rejects_non_bool_completed() {
        let err = validate_update(&json!({ "completed": "yes" })).unwrap_err();
        assert!(err.mentions("completed"));
    }

    #[test]
    fn test_update_rejects_unknown_and_immutable_fields() {
        let err = validate_update(&json!({ "id": "x", "createdAt": "2025-01-01" })).unwrap_err();
        assert!(err.mentions("id"));
        assert!(err.mentions("createdAt"));
    }

    #[test]
    fn test_update_reminder_time_requires_date_in_same_payload() {
        let err = validate_update(&json!({ "reminderTime": "09:00" })).unwrap_err();
        assert!(err.mentions("reminderTime"));

        let patch = validate_update(&json!({
            "reminderDate": "2025-06-01",
            "reminderTime": "09:00"
        }))
        .unwrap();
        assert_eq!(
            patch.reminder_date,
            Some(Some(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_storable_text() {
        assert!(storable_text("alice").is_ok());
        assert_eq!(storable_text("  ").unwrap_err().code, "blank");
        assert_eq!(storable_text("al\0ice").unwrap_err().code, "nul");
    }

    #[test]
    fn test_nul_characters_rejected() {
        let err = validate_create(&json!({ "title": "Buy\u{0}milk" })).unwrap_err();
        assert!(err.mentions("title"));

        let err = validate_create(&json!({ "title": "Buy milk", "description": "a\u{0}b" })).unwrap_err();
        assert!(err.mentions("description"));

        let err = validate_update(&json!({ "description": "\u{0}" })).unwrap_err();
        assert!(err.mentions("description"));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("smtp_host"), "smtpHost");
        assert_eq!(camel_case("title"), "title");
    }
}
