//! # mailvault-core
//!
//! Core reconciliation pipeline for `MailVault` email archives.
//!
//! This crate provides:
//! - Input record model for the export corpus (one JSON document per
//!   email)
//! - Participant resolution (find-or-create identities with
//!   department precedence)
//! - Discordance detection between structured fields and header text
//! - Email record assembly and storage (`SQLite`)
//! - Duplicate clustering by literal sequence reference
//! - Batch import with per-file fault isolation
//!
//! Header extraction itself lives in the `mailvault-header` crate;
//! this crate drives it and persists the results.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod db;
pub mod discordance;
pub mod duplicates;
pub mod email;
mod error;
pub mod import;
pub mod participant;
pub mod record;
pub mod time;

pub use db::Database;
pub use discordance::{
    ExtractedParty, RecipientDiscordance, SenderDiscordance, detect_recipients, detect_sender,
};
pub use duplicates::{DuplicateError, DuplicateTracker};
pub use email::{Attachment, EmailId, EmailRecord, EmailRecordBuilder, EmailRepository, NewEmail, RecipientLink};
pub use error::{Error, Result};
pub use import::{ImportSummary, ImportTask, Importer};
pub use participant::{Participant, ParticipantId, ParticipantRepository, ParticipantResolver};
pub use record::{RawRecord, SequenceRef, TimestampValue};
pub use time::{Clock, FixedClock, SystemClock};
