//! `mboxsplit` — split an MBOX archive into batched text digests and
//! extracted attachment files.
//!
//! The archive is streamed message by message: each message is decoded,
//! projected into a text record and collected into fixed-size batches, and
//! every batch is written to `messages-<n>/` as soon as it fills up.

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod parser;
