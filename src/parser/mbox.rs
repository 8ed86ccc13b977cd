//! Streaming MBOX framing.
//!
//! Splits an archive into per-message buffers, reading line by line through
//! a 1 MB buffer. Only the message currently being framed is held in
//! memory. Tolerant of malformed input.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{ExtractError, Result};

/// Size of the internal read buffer (1 MB for fast sequential reads on modern SSDs).
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Default maximum message size in bytes (256 MB).
pub const MAX_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

/// Report progress every 4 MB.
const PROGRESS_INTERVAL: u64 = 4 * 1024 * 1024;

/// Streaming MBOX reader.
///
/// Hands every framed message to a caller-supplied callback, in file order.
/// The reader is tolerant of:
///
/// - Mixed `\n` and `\r\n` line endings
/// - `From ` lines not preceded by a blank line (logs a warning)
/// - Truncated messages at EOF
/// - NUL bytes and other binary content in the body
/// - UTF-8 BOM at the start of the file
pub struct MboxReader {
    path: PathBuf,
    file_size: u64,
    max_message_size: usize,
}

impl MboxReader {
    /// Create a reader for the given MBOX file.
    ///
    /// Verifies that the file exists and is readable, but does NOT validate
    /// that it is actually an MBOX.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExtractError::FileNotFound(path.clone())
            } else {
                ExtractError::io(&path, e)
            }
        })?;
        Ok(Self {
            path,
            file_size: metadata.len(),
            max_message_size: MAX_MESSAGE_SIZE,
        })
    }

    /// Cap the size of a single framed message; longer bodies are truncated.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Total size of the underlying file in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Path to the MBOX file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frame the whole file, calling `message_callback` for each message.
    ///
    /// The callback receives `(offset, raw_bytes)` and returns `true` to
    /// continue or `false` to stop early. `progress_callback` receives
    /// `(bytes_read, file_size)`.
    ///
    /// Returns the number of messages delivered.
    pub fn for_each_message(
        &self,
        message_callback: &mut dyn FnMut(u64, &[u8]) -> bool,
        progress_callback: Option<&dyn Fn(u64, u64)>,
    ) -> Result<u64> {
        if self.file_size == 0 {
            return Ok(0);
        }

        let file = File::open(&self.path).map_err(|e| ExtractError::io(&self.path, e))?;
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        let file_size = self.file_size;
        let mut last_progress: u64 = 0;
        let mut on_progress = |bytes_read: u64| {
            if let Some(cb) = progress_callback {
                if bytes_read - last_progress >= PROGRESS_INTERVAL {
                    cb(bytes_read, file_size);
                    last_progress = bytes_read;
                }
            }
        };

        let count = frame_messages(reader, self.max_message_size, message_callback, &mut on_progress)
            .map_err(|e| ExtractError::io(&self.path, e))?;

        if let Some(cb) = progress_callback {
            cb(self.file_size, self.file_size);
        }

        Ok(count)
    }
}

/// Frame messages from any buffered byte stream.
///
/// `progress` is called after every line with the total bytes consumed.
pub fn frame_messages<R: BufRead>(
    mut reader: R,
    max_message_size: usize,
    message_callback: &mut dyn FnMut(u64, &[u8]) -> bool,
    progress: &mut dyn FnMut(u64),
) -> std::io::Result<u64> {
    let mut count: u64 = 0;
    let mut current_offset: u64 = 0;
    let mut message_buf: Vec<u8> = Vec::with_capacity(64 * 1024);
    let mut message_start: u64 = 0;
    let mut prev_line_was_empty = true;
    let mut first_line = true;
    let mut truncated = false;

    // Reusable line buffer
    let mut line_buf: Vec<u8> = Vec::with_capacity(4096);

    loop {
        line_buf.clear();
        let line_len = reader.read_until(b'\n', &mut line_buf)? as u64;
        if line_len == 0 {
            break; // EOF
        }

        if is_mbox_separator(&line_buf) {
            if !first_line && !prev_line_was_empty {
                warn!(
                    offset = current_offset,
                    "Found 'From ' separator without preceding blank line"
                );
            }
            if !message_buf.is_empty() {
                if !message_callback(message_start, &message_buf) {
                    return Ok(count);
                }
                count += 1;
            }
            message_start = current_offset;
            message_buf.clear();
            message_buf.extend_from_slice(&line_buf);
            truncated = false;
        } else if truncated {
            // Keep the buffer a prefix of the message.
        } else if message_buf.len() + line_buf.len() <= max_message_size {
            message_buf.extend_from_slice(&line_buf);
        } else {
            warn!(
                offset = message_start,
                max_size = max_message_size,
                "Message exceeds maximum size, truncating body"
            );
            truncated = true;
        }

        prev_line_was_empty = is_blank_line(&line_buf);
        first_line = false;
        current_offset += line_len;
        progress(current_offset);
    }

    // Flush last message
    if !message_buf.is_empty() && message_callback(message_start, &message_buf) {
        count += 1;
    }

    Ok(count)
}

/// Check whether a line is an MBOX separator (`From ` at the start).
fn is_mbox_separator(line: &[u8]) -> bool {
    strip_bom(line).starts_with(b"From ")
}

/// Drop a leading UTF-8 byte-order mark.
pub(crate) fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Check whether a line is blank (empty or only whitespace / CR / LF).
fn is_blank_line(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
}
