//! The extraction pipeline: decode, project, batch, write.
//!
//! One producer (the MBOX reader) hands framed messages to [`Pipeline::feed`]
//! in file order. Each message is decoded on its own; a message that fails
//! to decode is logged and skipped without consuming a mail id. Sealed
//! batches are written before the next message is read, so memory stays
//! bounded by one open batch.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::batch::{Batch, BatchAccumulator, ExtractedMessage};
use super::counter::Counter;
use super::project::project;
use super::sanitize::sanitize_filename;
use super::writer::BatchWriter;
use crate::config::Config;
use crate::error::{ExtractError, Result};
use crate::model::mail::ParsedMessage;
use crate::parser::mbox::MboxReader;
use crate::parser::mime::MimeDecoder;
use crate::parser::MessageDecoder;

/// Lifecycle of a [`Pipeline`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing fed yet.
    Idle,
    /// At least one message received.
    Streaming,
    /// Input ended; flushing the last partial batch.
    Draining,
    /// All batches written.
    Done,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunSummary {
    /// Framed messages received.
    pub messages_seen: u64,
    /// Messages decoded and batched.
    pub messages_parsed: u64,
    /// Messages skipped because they failed to decode.
    pub messages_failed: u64,
    pub batches_written: u64,
    pub attachments_written: u64,
    pub attachments_failed: u64,
    pub bytes_written: u64,
}

/// Single-use extraction pipeline.
pub struct Pipeline<D: MessageDecoder> {
    decoder: D,
    accumulator: BatchAccumulator,
    writer: BatchWriter,
    mail_ids: Counter,
    processed: Counter,
    state: PipelineState,
    summary: RunSummary,
}

impl<D: MessageDecoder> Pipeline<D> {
    /// Create a pipeline writing below `result_root`.
    ///
    /// Creates the result root if needed. Fails on a zero `batch_size` or if
    /// the root cannot be created.
    pub fn new(decoder: D, result_root: impl Into<PathBuf>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(ExtractError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        let root = result_root.into();
        std::fs::create_dir_all(&root).map_err(|e| ExtractError::io(&root, e))?;

        Ok(Self {
            decoder,
            accumulator: BatchAccumulator::new(batch_size),
            writer: BatchWriter::new(root),
            mail_ids: Counter::starting_at(0),
            processed: Counter::starting_at(1),
            state: PipelineState::Idle,
            summary: RunSummary::default(),
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Totals so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Process one framed message found at byte `offset` of the archive.
    ///
    /// Decode failures are logged and swallowed. Errors returned from here
    /// are batch-level (the batch directory or digest could not be written)
    /// or [`ExtractError::PipelineClosed`].
    pub fn feed(&mut self, offset: u64, raw: &[u8]) -> Result<()> {
        match self.state {
            PipelineState::Idle => self.state = PipelineState::Streaming,
            PipelineState::Streaming => {}
            PipelineState::Draining | PipelineState::Done => {
                return Err(ExtractError::PipelineClosed)
            }
        }
        self.summary.messages_seen += 1;

        let message = match self.decoder.decode(raw) {
            Ok(message) => message,
            Err(e) => {
                self.summary.messages_failed += 1;
                let e = ExtractError::ParseError {
                    offset,
                    reason: e.to_string(),
                };
                warn!(error = %e, "Skipping message that failed to parse");
                return Ok(());
            }
        };

        let extracted = extract(self.mail_ids.next_value(), message);
        self.summary.messages_parsed += 1;
        let processed = self.processed.next_value();
        debug!(processed, mail_id = extracted.mail_id, "Message read");

        match self.accumulator.push(extracted) {
            Some(batch) => self.write(&batch),
            None => Ok(()),
        }
    }

    /// Signal end of input: flush the partial batch, if any.
    ///
    /// Returns the totals for the run. The pipeline cannot be reused.
    pub fn finish(&mut self) -> Result<RunSummary> {
        match self.state {
            PipelineState::Idle | PipelineState::Streaming => {}
            PipelineState::Draining | PipelineState::Done => {
                return Err(ExtractError::PipelineClosed)
            }
        }
        self.state = PipelineState::Draining;

        if let Some(batch) = self.accumulator.close() {
            self.write(&batch)?;
        }

        self.state = PipelineState::Done;
        info!(
            parsed = self.summary.messages_parsed,
            failed = self.summary.messages_failed,
            batches = self.summary.batches_written,
            "The process has finished"
        );
        Ok(self.summary.clone())
    }

    fn write(&mut self, batch: &Batch) -> Result<()> {
        let report = self.writer.write(batch)?;
        self.summary.batches_written += 1;
        self.summary.attachments_written += report.attachments_written as u64;
        self.summary.attachments_failed += report.attachments_failed as u64;
        self.summary.bytes_written += report.bytes_written;
        Ok(())
    }
}

/// Rename the attachments of `message` to `mail-<id>-<name>` (sanitized)
/// and project its record.
pub fn extract(mail_id: u64, mut message: ParsedMessage) -> ExtractedMessage {
    for attachment in &mut message.attachments {
        attachment.filename = attachment
            .name()
            .map(|name| sanitize_filename(&format!("mail-{mail_id}-{name}")));
    }
    let record = project(&message);
    ExtractedMessage {
        mail_id,
        record,
        attachments: message.attachments,
    }
}

/// Run a whole extraction as described by `config`.
///
/// `progress` receives `(bytes_read, file_size)` while the archive is read.
pub fn extract_mbox(config: &Config, progress: Option<&dyn Fn(u64, u64)>) -> Result<RunSummary> {
    config.validate()?;

    let reader = MboxReader::new(&config.mbox_path)?.with_max_message_size(config.max_message_size);
    let mut pipeline = Pipeline::new(
        MimeDecoder,
        &config.result_path,
        config.grouped_messages_number,
    )?;

    info!(
        path = %reader.path().display(),
        size = reader.file_size(),
        batch_size = config.grouped_messages_number,
        "Start reading mails"
    );

    let mut failure: Option<ExtractError> = None;
    reader.for_each_message(
        &mut |offset, raw| match pipeline.feed(offset, raw) {
            Ok(()) => true,
            Err(e) => {
                failure = Some(e);
                false
            }
        },
        progress,
    )?;
    if let Some(e) = failure {
        return Err(e);
    }

    pipeline.finish()
}
