//! Parsed message type.

use chrono::{DateTime, Utc};

use super::address::EmailAddress;
use super::attachment::Attachment;

/// Structured result of decoding one framed message.
///
/// Lives only for one pass through the pipeline: it is projected into a
/// text record and its attachments move into the open batch.
#[derive(Debug, Clone, Default)]
pub struct ParsedMessage {
    /// The `Message-ID` header value, with angle brackets.
    pub message_id: Option<String>,

    /// Message-IDs from the `References` header.
    pub references: Vec<String>,

    /// `From:` addresses.
    pub from: Vec<EmailAddress>,

    /// `To:` addresses.
    pub to: Vec<EmailAddress>,

    /// `Cc:` addresses.
    pub cc: Vec<EmailAddress>,

    /// `Bcc:` addresses.
    pub bcc: Vec<EmailAddress>,

    /// `Reply-To:` addresses.
    pub reply_to: Vec<EmailAddress>,

    /// Message-IDs from the `In-Reply-To` header.
    pub in_reply_to: Vec<String>,

    /// `"high"`, `"normal"` or `"low"` when a priority header is present.
    pub priority: Option<String>,

    /// Parsed `Date:` header.
    pub date: Option<DateTime<Utc>>,

    /// Decoded subject line.
    pub subject: Option<String>,

    /// Plain-text body.
    pub text: Option<String>,

    /// Attachments in MIME order.
    pub attachments: Vec<Attachment>,
}
