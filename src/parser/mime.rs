//! MIME decoding of one framed message into a [`ParsedMessage`].

use chrono::{DateTime, Utc};
use mail_parser::{Address, HeaderValue, Message, MessageParser, MimeHeaders};

use crate::error::{ExtractError, Result};
use crate::model::address::EmailAddress;
use crate::model::attachment::Attachment;
use crate::model::mail::ParsedMessage;
use crate::parser::mbox::strip_bom;
use crate::parser::MessageDecoder;

/// [`MessageDecoder`] backed by `mail-parser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MimeDecoder;

impl MessageDecoder for MimeDecoder {
    fn decode(&self, raw: &[u8]) -> Result<ParsedMessage> {
        parse_message(raw)
    }
}

/// Parse a complete raw message (optional `From ` line, headers and body).
///
/// Fails when `mail-parser` rejects the input or when no header at all can
/// be recovered from it.
pub fn parse_message(raw_message: &[u8]) -> Result<ParsedMessage> {
    let message_bytes = skip_from_line(raw_message);
    if message_bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ExtractError::MimeError("Empty message".into()));
    }

    let msg = MessageParser::default()
        .parse(message_bytes)
        .ok_or_else(|| ExtractError::MimeError("Unparseable message".into()))?;

    if msg.headers().is_empty() {
        return Err(ExtractError::MimeError("Message has no headers".into()));
    }

    Ok(ParsedMessage {
        message_id: msg.message_id().map(bracketed),
        references: id_list(msg.references()),
        from: addresses(msg.from()),
        to: addresses(msg.to()),
        cc: addresses(msg.cc()),
        bcc: addresses(msg.bcc()),
        reply_to: addresses(msg.reply_to()),
        in_reply_to: id_list(msg.in_reply_to()),
        priority: priority(&msg),
        date: msg
            .date()
            .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0)),
        subject: msg.subject().map(String::from),
        text: body_text(&msg),
        attachments: attachments(&msg),
    })
}

/// Every inline text part, in order, joined with a newline.
fn body_text(msg: &Message<'_>) -> Option<String> {
    let parts: Vec<String> = (0..)
        .map_while(|i| msg.body_text(i))
        .map(|s| s.into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Collect every attachment with its decoded content.
fn attachments(msg: &Message<'_>) -> Vec<Attachment> {
    msg.attachments()
        .map(|part| {
            let content_type = part
                .content_type()
                .map(|ct| match ct.subtype() {
                    Some(sub) => format!("{}/{}", ct.ctype(), sub),
                    None => ct.ctype().to_string(),
                })
                .unwrap_or_else(|| "application/octet-stream".to_string());

            Attachment {
                filename: part
                    .attachment_name()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from),
                content_type,
                content: part.contents().to_vec(),
            }
        })
        .collect()
}

/// Flatten plain lists and groups into one address list.
fn addresses(address: Option<&Address<'_>>) -> Vec<EmailAddress> {
    match address {
        Some(Address::List(list)) => list.iter().map(EmailAddress::from).collect(),
        Some(Address::Group(groups)) => groups
            .iter()
            .flat_map(|g| g.addresses.iter())
            .map(EmailAddress::from)
            .collect(),
        None => Vec::new(),
    }
}

/// Message-ID style header (`References`, `In-Reply-To`) as bracketed ids.
fn id_list(value: &HeaderValue<'_>) -> Vec<String> {
    match value {
        HeaderValue::Text(id) => vec![bracketed(id)],
        HeaderValue::TextList(ids) => ids.iter().map(|id| bracketed(id)).collect(),
        _ => Vec::new(),
    }
}

fn bracketed(id: &str) -> String {
    format!("<{}>", id.trim_matches(|c| c == '<' || c == '>'))
}

/// Map `X-Priority`, `Importance` or `Priority` to high / normal / low.
fn priority(msg: &Message<'_>) -> Option<String> {
    let value_of = |name: &str| {
        msg.headers()
            .iter()
            .find(|h| h.name().eq_ignore_ascii_case(name))
            .and_then(|h| h.value().as_text())
            .map(|v| v.trim().to_ascii_lowercase())
    };

    let level = if let Some(v) = value_of("X-Priority") {
        match v.chars().next() {
            Some('1') | Some('2') => "high",
            Some('4') | Some('5') => "low",
            _ => "normal",
        }
    } else if let Some(v) = value_of("Importance") {
        match v.as_str() {
            "high" => "high",
            "low" => "low",
            _ => "normal",
        }
    } else if let Some(v) = value_of("Priority") {
        match v.as_str() {
            "urgent" => "high",
            "non-urgent" => "low",
            _ => "normal",
        }
    } else {
        return None;
    };
    Some(level.to_string())
}

/// Skip the `From ` separator line at the start of MBOX messages.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = strip_bom(data);
    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
        return &[];
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPART: &[u8] = b"From alice@example.com Thu Jan 04 10:00:00 2024\r\n\
From: Alice <alice@example.com>\r\n\
To: Bob <bob@example.com>, carol@example.com\r\n\
Subject: Quarterly report\r\n\
Date: Thu, 04 Jan 2024 10:00:00 +0000\r\n\
Message-ID: <q1@example.com>\r\n\
In-Reply-To: <q0@example.com>\r\n\
References: <a@example.com> <q0@example.com>\r\n\
X-Priority: 1 (Highest)\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
See attached.\r\n\
--XYZ\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=\"report (final).pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
SGVsbG8=\r\n\
--XYZ--\r\n";

    #[test]
    fn test_parse_fields() {
        let msg = parse_message(MULTIPART).unwrap();
        assert_eq!(msg.message_id.as_deref(), Some("<q1@example.com>"));
        assert_eq!(msg.in_reply_to, vec!["<q0@example.com>"]);
        assert_eq!(msg.references, vec!["<a@example.com>", "<q0@example.com>"]);
        assert_eq!(msg.from, vec![EmailAddress::new("Alice", "alice@example.com")]);
        assert_eq!(msg.to.len(), 2);
        assert_eq!(msg.to[1].address, "carol@example.com");
        assert!(msg.cc.is_empty());
        assert_eq!(msg.subject.as_deref(), Some("Quarterly report"));
        assert_eq!(msg.priority.as_deref(), Some("high"));
        assert_eq!(
            msg.date.map(|d| d.to_rfc3339()),
            Some("2024-01-04T10:00:00+00:00".to_string())
        );
        assert!(msg.text.as_deref().unwrap_or("").contains("See attached."));
    }

    #[test]
    fn test_parse_attachment_content() {
        let msg = parse_message(MULTIPART).unwrap();
        assert_eq!(msg.attachments.len(), 1);
        let att = &msg.attachments[0];
        assert_eq!(att.filename.as_deref(), Some("report (final).pdf"));
        assert_eq!(att.content_type, "application/pdf");
        assert_eq!(att.content, b"Hello");
    }

    #[test]
    fn test_all_text_parts_reach_body() {
        let raw = b"From: a@example.com\r\n\
Subject: split body\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"S\"\r\n\
\r\n\
--S\r\n\
Content-Type: text/plain\r\n\
\r\n\
part one\r\n\
--S\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=\"a.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
SGVsbG8=\r\n\
--S\r\n\
Content-Type: text/plain\r\n\
\r\n\
part two\r\n\
--S--\r\n";
        let msg = parse_message(raw).unwrap();
        let text = msg.text.unwrap();
        assert!(text.contains("part one"));
        assert!(text.contains("part two"));
        assert!(text.find("part one") < text.find("part two"));
    }

    #[test]
    fn test_no_priority_header() {
        let msg = parse_message(b"Subject: plain\n\nbody\n").unwrap();
        assert_eq!(msg.priority, None);
        assert_eq!(msg.date, None);
    }

    #[test]
    fn test_empty_message_is_error() {
        assert!(parse_message(b"From someone Thu Jan 04 10:00:00 2024\n\n").is_err());
        assert!(parse_message(b"").is_err());
    }

    #[test]
    fn test_skip_from_line() {
        let data = b"From user@example.com Thu Jan 01 00:00:00 2024\nSubject: Test\n\nBody\n";
        assert!(skip_from_line(data).starts_with(b"Subject:"));
        let data = b"Subject: Test\n\nBody\n";
        assert_eq!(skip_from_line(data), data);
    }
}
