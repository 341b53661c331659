use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
    Audio,
    Video,
}

/// Metadata for a file stored elsewhere; the binary never passes through this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[validate(length(
        min = 1,
        max = 255,
        message = "attachment name must be between 1 and 255 characters"
    ))]
    pub name: String,

    #[validate(url(message = "attachment url must be a valid URL"))]
    pub url: String,

    pub kind: AttachmentKind,

    #[validate(range(min = 0, message = "attachment size must not be negative"))]
    pub size: i64,
}
