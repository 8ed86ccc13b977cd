//! Projection of a parsed message into its digest record.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::address::{join_addresses, EmailAddress};
use crate::model::mail::ParsedMessage;

/// Line separator inside a record.
pub const FIELD_SEPARATOR: &str = "\r\n";

/// The human-readable, line-oriented form of one message.
///
/// Holds `(field, value)` pairs in a fixed order; empty values are never
/// stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRecord {
    fields: Vec<(&'static str, String)>,
}

impl TextRecord {
    /// Append a field unless `value` is absent or empty.
    fn push(&mut self, name: &'static str, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.fields.push((name, value));
        }
    }

    /// Value of `name`, if the record has that line.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Field names in output order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Number of lines (fields) in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as `"<field>: <value>"` lines joined with CRLF.
    pub fn render(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join(FIELD_SEPARATOR)
    }
}

impl std::fmt::Display for TextRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Build the record for `message`.
///
/// The `attachments` line lists the filenames exactly as stored on the
/// message, so the caller must rename attachments before projecting.
pub fn project(message: &ParsedMessage) -> TextRecord {
    let mut record = TextRecord::default();

    record.push("messageId", message.message_id.clone());
    record.push("references", Some(message.references.join(", ")));
    record.push("from", addresses(&message.from));
    record.push("to", addresses(&message.to));
    record.push("cc", addresses(&message.cc));
    record.push("bcc", addresses(&message.bcc));
    record.push("replyTo", addresses(&message.reply_to));
    record.push("inReplyTo", Some(message.in_reply_to.join(", ")));
    record.push("priority", message.priority.clone());
    record.push("date", message.date.as_ref().map(iso_date));
    record.push("subject", message.subject.clone());
    record.push("data", message.text.clone());
    record.push(
        "attachments",
        Some(
            message
                .attachments
                .iter()
                .filter_map(|a| a.name())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    );

    record
}

fn addresses(list: &[EmailAddress]) -> Option<String> {
    Some(join_addresses(list))
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-01-04T10:00:00.000Z`.
fn iso_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attachment::Attachment;
    use chrono::TimeZone;

    fn sample() -> ParsedMessage {
        ParsedMessage {
            message_id: Some("<m1@example.com>".into()),
            references: vec!["<a@x>".into(), "<b@x>".into()],
            from: vec![EmailAddress::new("Alice", "alice@example.com")],
            to: vec![
                EmailAddress::new("Bob", "bob@example.com"),
                EmailAddress::new("", "carol@example.com"),
            ],
            in_reply_to: vec!["<b@x>".into()],
            date: Some(Utc.with_ymd_and_hms(2024, 1, 4, 10, 0, 0).unwrap()),
            subject: Some("Hello".into()),
            text: Some("Body text".into()),
            attachments: vec![
                Attachment {
                    filename: Some("mail-0-a.pdf".into()),
                    ..Attachment::default()
                },
                Attachment {
                    filename: Some("mail-0-b.png".into()),
                    ..Attachment::default()
                },
            ],
            ..ParsedMessage::default()
        }
    }

    #[test]
    fn test_field_order() {
        let record = project(&sample());
        let names: Vec<_> = record.field_names().collect();
        assert_eq!(
            names,
            vec![
                "messageId",
                "references",
                "from",
                "to",
                "inReplyTo",
                "date",
                "subject",
                "data",
                "attachments"
            ]
        );
    }

    #[test]
    fn test_values() {
        let record = project(&sample());
        assert_eq!(record.get("references"), Some("<a@x>, <b@x>"));
        assert_eq!(
            record.get("to"),
            Some("Bob <bob@example.com>, carol@example.com")
        );
        assert_eq!(record.get("date"), Some("2024-01-04T10:00:00.000Z"));
        assert_eq!(record.get("attachments"), Some("mail-0-a.pdf, mail-0-b.png"));
    }

    #[test]
    fn test_missing_cc_has_no_line() {
        let rendered = project(&sample()).render();
        assert!(!rendered.lines().any(|l| l.starts_with("cc:")));
        assert!(!rendered.contains("priority:"));
    }

    #[test]
    fn test_render_crlf() {
        let msg = ParsedMessage {
            subject: Some("Hi".into()),
            text: Some("Body".into()),
            ..ParsedMessage::default()
        };
        assert_eq!(project(&msg).render(), "subject: Hi\r\ndata: Body");
    }

    #[test]
    fn test_empty_values_dropped() {
        let msg = ParsedMessage {
            subject: Some(String::new()),
            cc: vec![EmailAddress::default()],
            attachments: vec![Attachment::default()],
            ..ParsedMessage::default()
        };
        let record = project(&msg);
        assert!(record.is_empty());
        assert_eq!(record.render(), "");
    }
}
