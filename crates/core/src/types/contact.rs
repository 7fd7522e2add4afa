//! Contact form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContactId, ContactStatus, Email, ValidationError, require};

/// Fields visitors fill in on the contact page; the body of `POST /contact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl ContactForm {
    /// Trim every field, normalize the email and drop blank optionals.
    ///
    /// HTML forms send empty strings for untouched inputs, so `Some("")`
    /// becomes `None` here.
    ///
    /// # Errors
    ///
    /// Returns the first blank required field, or an invalid email.
    pub fn validated(self) -> Result<Self, ValidationError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("subject", &self.subject)?;
        require("message", &self.message)?;
        let email = Email::parse(&self.email)?;

        let optional = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            name: self.name.trim().to_string(),
            email: email.into(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
            phone: optional(self.phone),
            company: optional(self.company),
        })
    }
}

/// A stored submission as returned by the contact endpoints.
///
/// Submission listings may omit the original fields, so only `id` is
/// guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: ContactId,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: " Ada ".to_string(),
            email: "Ada@Example.com".to_string(),
            subject: "Quote".to_string(),
            message: "We need a website.\n".to_string(),
            phone: Some(String::new()),
            company: Some(" Analytical Engines ".to_string()),
        }
    }

    #[test]
    fn test_validated_normalizes_fields() {
        let form = form().validated().unwrap();
        assert_eq!(form.name, "Ada");
        assert_eq!(form.email, "Ada@example.com");
        assert_eq!(form.message, "We need a website.");
        assert_eq!(form.phone, None);
        assert_eq!(form.company.as_deref(), Some("Analytical Engines"));
    }

    #[test]
    fn test_validated_rejects_missing_fields() {
        let mut missing_subject = form();
        missing_subject.subject = String::new();
        assert_eq!(
            missing_subject.validated(),
            Err(ValidationError::Required("subject"))
        );

        let mut bad_email = form();
        bad_email.email = "ada-at-example".to_string();
        assert!(matches!(
            bad_email.validated(),
            Err(ValidationError::Email(_))
        ));
    }

    #[test]
    fn test_submission_defaults_status() {
        let submission: ContactSubmission = serde_json::from_str(r#"{"id": 101}"#).unwrap();
        assert_eq!(submission.status, ContactStatus::Pending);
        assert!(submission.submitted_at.is_none());

        let submission: ContactSubmission = serde_json::from_str(
            r#"{"id": 5, "status": "responded", "submittedAt": "2024-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(submission.status, ContactStatus::Responded);
        assert!(submission.submitted_at.is_some());
    }
}
