//! Message entity - a chat message and its attachments

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Message entity
///
/// Content is optional so attachment-only messages are representable.
/// `reply_to` is fixed at creation and may only reference a strictly
/// earlier message in the same channel; when the referent is deleted it is
/// nulled, never cascaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    pub content: Option<String>,
    pub reply_to: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a new Message
    pub fn new(
        id: Snowflake,
        channel_id: Snowflake,
        author_id: Snowflake,
        content: Option<String>,
    ) -> Self {
        Self {
            id,
            channel_id,
            author_id,
            content,
            reply_to: None,
            created_at: Utc::now(),
            edited_at: None,
        }
    }

    /// Mark this message as a reply to an earlier one
    pub fn with_reply_to(mut self, reference: Snowflake) -> Self {
        self.reply_to = Some(reference);
        self
    }

    /// Check if message has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// Edit the message content, stamping the edit time
    pub fn edit(&mut self, content: Option<String>) {
        self.content = content;
        self.edited_at = Some(Utc::now());
    }

    /// Check if the message carries neither content nor (per caller) attachments
    #[inline]
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

/// Attachment entity
///
/// Raw bytes live in an external object store; `storage_key` is the opaque
/// pointer into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: Snowflake,
    pub message_id: Snowflake,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub storage_key: String,
    pub encryption_param: Option<String>,
}

impl Attachment {
    /// Create a new Attachment
    pub fn new(
        id: Snowflake,
        message_id: Snowflake,
        filename: String,
        content_type: String,
        size: i64,
        storage_key: String,
    ) -> Self {
        Self {
            id,
            message_id,
            filename,
            content_type,
            size,
            storage_key,
            encryption_param: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_sets_timestamp() {
        let mut msg = Message::new(
            Snowflake::new(2),
            Snowflake::new(1),
            Snowflake::new(3),
            Some("hello".to_string()),
        );
        assert!(!msg.is_edited());

        msg.edit(Some("hello, edited".to_string()));
        assert!(msg.is_edited());
        assert_eq!(msg.content.as_deref(), Some("hello, edited"));
    }

    #[test]
    fn test_attachment_only_message() {
        let msg = Message::new(Snowflake::new(2), Snowflake::new(1), Snowflake::new(3), None);
        assert!(!msg.has_content());
    }
}
