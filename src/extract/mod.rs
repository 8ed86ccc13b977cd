//! Batched extraction of messages and attachments to disk.

pub mod batch;
pub mod counter;
pub mod pipeline;
pub mod project;
pub mod sanitize;
pub mod writer;

pub use pipeline::{extract_mbox, Pipeline, PipelineState, RunSummary};
