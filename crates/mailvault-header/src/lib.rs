//! # mailvault-header
//!
//! Header-block extraction for `MailVault` email archives.
//!
//! The export corpus carries a free-text header block alongside its
//! structured fields. This crate extracts candidate participant
//! identities (name, address, department) from that block using the
//! exact `From:`/`To:` conventions present in the corpus. It is not a
//! general email-parsing library.
//!
//! ## Quick Start
//!
//! ### Extracting the sender
//!
//! ```
//! use mailvault_header::parse_sender;
//!
//! let header = "From: Jane Doe (LEGAL) (jane@example.com)\nTo: Bob Roe (bob@example.com)";
//!
//! let sender = parse_sender(header).unwrap();
//! assert_eq!(sender.name, "Jane Doe");
//! assert_eq!(sender.email.as_deref(), Some("jane@example.com"));
//! assert_eq!(sender.department.as_deref(), Some("LEGAL"));
//! ```
//!
//! ### Extracting recipients
//!
//! ```
//! use mailvault_header::parse_recipients;
//!
//! let header = "To: Bob Roe (bob@example.com)\nTo: Ann Smith <ann@example.com>";
//!
//! let recipients = parse_recipients(header);
//! assert_eq!(recipients.len(), 2);
//! ```
//!
//! ### Address validation
//!
//! ```
//! use mailvault_header::address;
//!
//! assert!(address::is_valid("jane@example.com"));
//! assert!(!address::is_valid("jane@nowhere"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
mod candidate;
mod recipient;
mod sender;

pub use candidate::{ParticipantCandidate, is_valid_name};
pub use recipient::parse_recipients;
pub use sender::parse_sender;

use regex::Regex;

/// Compiles a pattern known at build time.
#[allow(clippy::expect_used)]
pub(crate) fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("hard-coded pattern compiles")
}
