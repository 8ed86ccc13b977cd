//! Core data model types for parsed messages, addresses, and attachments.

pub mod address;
pub mod attachment;
pub mod mail;
