//! Message parsing: MBOX framing and MIME decoding.

pub mod mbox;
pub mod mime;

use crate::error::Result;
use crate::model::mail::ParsedMessage;

/// Turns one framed message into a [`ParsedMessage`].
///
/// The extraction pipeline only talks to this trait, so a failing decode
/// stays local to the message that caused it.
pub trait MessageDecoder {
    /// Decode a raw message buffer.
    fn decode(&self, raw: &[u8]) -> Result<ParsedMessage>;
}
