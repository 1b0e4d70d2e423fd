/// Notification and branding settings
///
/// The shape administrators edit: app branding plus the two reminder channels
/// (SMTP email and ntfy push). Only the shape and its validation live here;
/// nothing in this crate sends mail or push messages.
///
/// # Example
///
/// ```
/// use taskflow_shared::models::settings::NotificationSettings;
///
/// let mut settings = NotificationSettings::default();
/// assert!(settings.validate().is_ok());
///
/// settings.ntfy.enabled = true;
/// settings.ntfy.topic = String::new();
/// assert!(settings.validate().unwrap_err().mentions("ntfy.topic"));
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidateEmail, ValidateUrl};

use crate::validation::{FieldError, ValidationFailure};

/// Default SMTP submission port
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Public ntfy instance
pub const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";

pub const DEFAULT_APP_TITLE: &str = "TaskFlow";

/// Built-in reminder email body (Handlebars-style placeholders)
pub const DEFAULT_EMAIL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Task Reminder</title>
</head>
<body style="font-family: Arial, sans-serif; margin: 20px; color: #333;">
    <div style="background-color: #f5f5f5; padding: 20px; border-radius: 8px;">
        <h2 style="color: #6366f1;">Task Reminder</h2>
        <div style="background-color: white; padding: 15px; border-radius: 6px; margin: 10px 0;">
            <h3>{{task.title}}</h3>
            <p><strong>Priority:</strong> <span style="color: {{priority.color}};">{{task.priority}}</span></p>
            <p><strong>Due:</strong> {{task.dueDate}}</p>
            {{#if task.description}}
            <p><strong>Description:</strong> {{task.description}}</p>
            {{/if}}
        </div>
        <p style="color: #666; font-size: 12px;">Sent from TaskFlow</p>
    </div>
</body>
</html>"#;

/// ntfy message priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NtfyPriority {
    Min,
    Low,
    #[default]
    Default,
    High,
    Max,
}

impl NtfyPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NtfyPriority::Min => "min",
            NtfyPriority::Low => "low",
            NtfyPriority::Default => "default",
            NtfyPriority::High => "high",
            NtfyPriority::Max => "max",
        }
    }
}

impl fmt::Display for NtfyPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SMTP reminder channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailSettings {
    pub enabled: bool,

    #[validate(length(max = 255, message = "SMTP host must be at most 255 characters"))]
    pub smtp_host: String,

    #[validate(range(min = 1, message = "SMTP port must be between 1 and 65535"))]
    pub smtp_port: u16,

    pub smtp_username: String,

    /// Never logged
    pub smtp_password: String,

    /// Implicit TLS rather than STARTTLS
    pub smtp_secure: bool,

    pub email_from: String,

    #[validate(length(min = 1, message = "Email template cannot be empty"))]
    pub email_template: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: DEFAULT_SMTP_PORT,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_secure: false,
            email_from: String::new(),
            email_template: DEFAULT_EMAIL_TEMPLATE.to_string(),
        }
    }
}

/// ntfy push channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NtfySettings {
    pub enabled: bool,
    pub server: String,
    #[validate(length(max = 64, message = "Topic must be at most 64 characters"))]
    pub topic: String,
    pub priority: NtfyPriority,
}

impl Default for NtfySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            server: DEFAULT_NTFY_SERVER.to_string(),
            topic: String::new(),
            priority: NtfyPriority::Default,
        }
    }
}

/// Branding plus reminder channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    #[validate(length(min = 1, max = 100, message = "App title must be 1-100 characters"))]
    pub app_title: String,

    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,

    #[validate(nested)]
    pub email: EmailSettings,

    #[validate(nested)]
    pub ntfy: NtfySettings,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            app_title: DEFAULT_APP_TITLE.to_string(),
            logo_url: None,
            email: EmailSettings::default(),
            ntfy: NtfySettings::default(),
        }
    }
}

impl NotificationSettings {
    /// Checks field constraints, then the requirements of enabled channels
    ///
    /// Errors use dotted camelCase paths (`email.smtpHost`, `ntfy.topic`).
    pub fn validate(&self) -> Result<(), ValidationFailure> {
        let mut errors = match Validate::validate(self) {
            Ok(()) => Vec::new(),
            Err(e) => ValidationFailure::from(e).errors,
        };

        if self.email.enabled {
            if self.email.smtp_host.trim().is_empty() {
                errors.push(FieldError::new(
                    "email.smtpHost",
                    "SMTP host is required when email is enabled",
                ));
            }
            if !self.email.email_from.validate_email() {
                errors.push(FieldError::new(
                    "email.emailFrom",
                    "A valid sender address is required when email is enabled",
                ));
            }
        }

        if self.ntfy.enabled {
            if !self.ntfy.server.validate_url() {
                errors.push(FieldError::new(
                    "ntfy.server",
                    "A valid server URL is required when ntfy is enabled",
                ));
            }
            if self.ntfy.topic.trim().is_empty() {
                errors.push(FieldError::new(
                    "ntfy.topic",
                    "Topic is required when ntfy is enabled",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            errors.sort_by(|a, b| a.field.cmp(&b.field));
            Err(ValidationFailure { errors })
        }
    }

    /// True if at least one reminder channel is switched on
    pub fn any_channel_enabled(&self) -> bool {
        self.email.enabled || self.ntfy.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = NotificationSettings::default();
        assert_eq!(settings.app_title, "TaskFlow");
        assert_eq!(settings.email.smtp_port, 587);
        assert_eq!(settings.ntfy.server, "https://ntfy.sh");
        assert_eq!(settings.ntfy.priority, NtfyPriority::Default);
        assert!(settings.email.email_template.contains("{{task.title}}"));
        assert!(!settings.any_channel_enabled());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let settings: NotificationSettings = serde_json::from_value(json!({
            "appTitle": "My Tasks",
            "ntfy": { "enabled": true, "topic": "reminders", "priority": "high" }
        }))
        .unwrap();

        assert_eq!(settings.app_title, "My Tasks");
        assert_eq!(settings.ntfy.server, DEFAULT_NTFY_SERVER);
        assert_eq!(settings.ntfy.priority, NtfyPriority::High);
        assert_eq!(settings.ntfy.priority.to_string(), "high");
        assert_eq!(settings.email.smtp_port, DEFAULT_SMTP_PORT);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_unknown_priority_rejected() {
        let result: Result<NtfySettings, _> =
            serde_json::from_value(json!({ "priority": "urgent" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_enabled_email_requires_host_and_sender() {
        let mut settings = NotificationSettings::default();
        settings.email.enabled = true;
        settings.email.email_from = "not-an-address".to_string();

        let err = settings.validate().unwrap_err();
        assert!(err.mentions("email.smtpHost"));
        assert!(err.mentions("email.emailFrom"));

        settings.email.smtp_host = "smtp.example.com".to_string();
        settings.email.email_from = "reminders@example.com".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut settings = NotificationSettings::default();
        settings.email.smtp_port = 0;
        assert!(settings.validate().unwrap_err().mentions("email.smtpPort"));
    }

    #[test]
    fn test_enabled_ntfy_requires_server_url() {
        let mut settings = NotificationSettings::default();
        settings.ntfy.enabled = true;
        settings.ntfy.topic = "taskflow".to_string();
        settings.ntfy.server = "ntfy".to_string();

        let err = settings.validate().unwrap_err();
        assert!(err.mentions("ntfy.server"));
        assert!(!err.mentions("ntfy.topic"));
    }

    #[test]
    fn test_invalid_logo_url_and_blank_title() {
        let mut settings = NotificationSettings::default();
        settings.logo_url = Some("logo.png".to_string());
        settings.app_title = String::new();

        let err = settings.validate().unwrap_err();
        assert!(err.mentions("logoUrl"));
        assert!(err.mentions("appTitle"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(NotificationSettings::default()).unwrap();
        assert!(json.get("appTitle").is_some());
        assert!(json["email"].get("smtpPort").is_some());
        assert_eq!(json["ntfy"]["priority"], "default");
    }
}
