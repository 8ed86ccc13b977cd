//! Decoded attachment payloads.

/// One attachment of a parsed message, with its decoded content.
///
/// The payload is held only while the owning batch is open; it is dropped
/// as soon as the batch has been written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachment {
    /// Filename. The parser stores the name from the MIME headers; the
    /// pipeline replaces it with the sanitized `mail-<n>-<name>` form.
    /// `None` when the headers carry no usable name.
    pub filename: Option<String>,

    /// MIME content type (e.g. `"image/jpeg"`, `"application/pdf"`).
    pub content_type: String,

    /// Decoded bytes.
    pub content: Vec<u8>,
}

impl Attachment {
    /// The filename, if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.filename.as_deref().filter(|n| !n.is_empty())
    }
}
