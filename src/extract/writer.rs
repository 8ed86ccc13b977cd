//! Materialize sealed batches on disk.
//!
//! Layout under the result root:
//!
//! ```text
//! messages-<n>/messages.txt
//! messages-<n>/attachments/<filename>
//! ```

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::batch::Batch;
use super::counter::Counter;
use crate::error::{ExtractError, Result};

/// Line placed between two records in `messages.txt`.
pub const MESSAGE_SEPARATOR: &str = "\r\n----------------End of the mail----------------\r\n";

/// Name of the digest file inside each batch directory.
pub const DIGEST_FILE: &str = "messages.txt";

/// Name of the attachment directory inside each batch directory.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// What one call to [`BatchWriter::write`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchReport {
    pub number: u64,
    pub messages: usize,
    pub attachments_written: usize,
    pub attachments_failed: usize,
    /// Bytes of digest text and attachment content written.
    pub bytes_written: u64,
    /// `(mail_id, placeholder)` for every attachment that had no name.
    pub placeholders: Vec<(u64, String)>,
}

/// Writes batches below a result root.
#[derive(Debug)]
pub struct BatchWriter {
    root: PathBuf,
    anonymous_names: Counter,
}

impl BatchWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            anonymous_names: Counter::starting_at(1),
        }
    }

    /// Directory that holds batch `number`.
    pub fn batch_dir(&self, number: u64) -> PathBuf {
        self.root.join(format!("messages-{number}"))
    }

    /// Write `batch`: directories, then the digest, then every attachment.
    ///
    /// Failing to create the directories or the digest is an error for the
    /// whole batch. A failing attachment is logged and skipped.
    pub fn write(&mut self, batch: &Batch) -> Result<BatchReport> {
        let dir = self.batch_dir(batch.number);
        let attachment_dir = dir.join(ATTACHMENTS_DIR);
        info!(batch = batch.number, dir = %dir.display(), "Creating output");

        std::fs::create_dir_all(&attachment_dir)
            .map_err(|e| ExtractError::io(&attachment_dir, e))?;

        let mut report = BatchReport {
            number: batch.number,
            messages: batch.len(),
            ..BatchReport::default()
        };

        let digest_path = dir.join(DIGEST_FILE);
        let digest = render_digest(batch);
        std::fs::write(&digest_path, &digest).map_err(|e| ExtractError::io(&digest_path, e))?;
        report.bytes_written += digest.len() as u64;
        debug!(path = %digest_path.display(), records = batch.len(), "Wrote text file");

        let attachments = batch
            .messages
            .iter()
            .flat_map(|m| m.attachments.iter().map(move |a| (m.mail_id, a)));
        for (mail_id, attachment) in attachments {
            let filename = match attachment.name() {
                Some(name) => name.to_string(),
                None => {
                    let placeholder =
                        format!("no-filename-{}", self.anonymous_names.next_value());
                    info!(
                        batch = batch.number,
                        mail_id,
                        filename = %placeholder,
                        "Attachment has no name, using placeholder"
                    );
                    report.placeholders.push((mail_id, placeholder.clone()));
                    placeholder
                }
            };
            let path = attachment_dir.join(&filename);
            match std::fs::write(&path, &attachment.content) {
                Ok(()) => {
                    report.attachments_written += 1;
                    report.bytes_written += attachment.content.len() as u64;
                }
                Err(e) => {
                    report.attachments_failed += 1;
                    warn!(
                        batch = batch.number,
                        mail_id,
                        filename = %filename,
                        error = %e,
                        "Failed to write attachment"
                    );
                }
            }
        }

        info!(
            batch = batch.number,
            messages = report.messages,
            attachments = report.attachments_written,
            failed = report.attachments_failed,
            "Batch written"
        );
        Ok(report)
    }
}

/// Join the rendered records of a batch with [`MESSAGE_SEPARATOR`].
pub fn render_digest(batch: &Batch) -> String {
    batch
        .messages
        .iter()
        .map(|m| m.record.render())
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR)
}
