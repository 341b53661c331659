use super::attachment::Attachment;
use crate::error::{AppError, AppResult};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub recipient_id: i64,
    pub content: String,
    pub subject: Option<String>,
    pub reply_to_id: Option<i64>,
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMessageRequest {
    pub content: String,
    /// `None` keeps the attachments the message already has.
    pub attachments: Option<Vec<Attachment>>,
}

/// Trimmed, validated message body shared by send and edit.
#[derive(Debug, Clone, Validate)]
pub struct MessageDraft {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "content must be between 1 and 2000 characters"
    ))]
    pub content: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "subject must be between 1 and 100 characters"
    ))]
    pub subject: Option<String>,

    #[validate(length(max = 10, message = "at most 10 attachments are allowed"))]
    pub attachments: Option<Vec<Attachment>>,
}

impl MessageDraft {
    pub fn new(
        content: &str,
        subject: Option<&str>,
        attachments: Option<Vec<Attachment>>,
    ) -> AppResult<Self> {
        let draft = Self {
            content: content.trim().to_string(),
            subject: subject.map(|s| s.trim().to_string()),
            attachments,
        };

        draft
            .validate()
            .map_err(|e| AppError::Validation(describe(&e)))?;

        if let Some(attachments) = &draft.attachments {
            for attachment in attachments {
                attachment
                    .validate()
                    .map_err(|e| AppError::Validation(describe(&e)))?;
            }
        }

        Ok(draft)
    }
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttachmentKind;

    fn attachment() -> Attachment {
        Attachment {
            name: "doc.pdf".into(),
            url: "https://files.example.com/doc.pdf".into(),
            kind: AttachmentKind::File,
            size: 1024,
        }
    }

    #[test]
    fn content_length_boundaries() {
        assert!(MessageDraft::new("", None, None).is_err());
        assert!(MessageDraft::new("   ", None, None).is_err());
        assert!(MessageDraft::new("x", None, None).is_ok());
        assert!(MessageDraft::new(&"x".repeat(2000), None, None).is_ok());
        assert!(MessageDraft::new(&"x".repeat(2001), None, None).is_err());
    }

    #[test]
    fn content_is_counted_in_characters_after_trim() {
        let padded = format!("  {}  ", "ß".repeat(2000));
        let draft = MessageDraft::new(&padded, None, None).unwrap();
        assert_eq!(draft.content.chars().count(), 2000);
    }

    #[test]
    fn subject_bounds_apply_only_when_present() {
        assert!(MessageDraft::new("hi", Some(" "), None).is_err());
        assert!(MessageDraft::new("hi", Some(&"s".repeat(101)), None).is_err());
        let draft = MessageDraft::new("hi", Some("  Hello "), None).unwrap();
        assert_eq!(draft.subject.as_deref(), Some("Hello"));
    }

    #[test]
    fn attachments_are_limited_and_validated() {
        assert!(MessageDraft::new("hi", None, Some(vec![attachment(); 10])).is_ok());
        assert!(MessageDraft::new("hi", None, Some(vec![attachment(); 11])).is_err());

        let mut broken = attachment();
        broken.name = String::new();
        let err = MessageDraft::new("hi", None, Some(vec![broken])).unwrap_err();
        assert!(err.to_string().contains("attachment name"));
    }
}
