//! Recipient extraction from `To:` occurrences.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::address;
use crate::candidate::{ParticipantCandidate, is_valid_name};
use crate::pattern;

// Recipient names stay on their own line so that a header mixing the
// two formats yields every entry (the resolver collapses a recipient
// that appears in both forms onto one participant).
static PAREN_RECIPIENT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"To: ([^(\n]+)\s*\(([^)\n]+@[^)\n]+)\)"));

static ANGLE_RECIPIENT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"To: ([^<\n]+)\s*<([^>\n]+@[^>\n]+)>"));

/// Extracts every recipient identity from a free-text header block.
///
/// Only `To:` occurrences are considered, in two formats:
/// `To: <name> (<email>)` and `To: <name> <<email>>`. All matches are
/// collected (a header may list several recipients); deduplication of
/// entries that resolve to the same participant is the caller's
/// responsibility.
#[must_use]
pub fn parse_recipients(header: &str) -> Vec<ParticipantCandidate> {
    let mut recipients = Vec::new();
    for caps in PAREN_RECIPIENT.captures_iter(header) {
        push_recipient(&mut recipients, &caps[1], &caps[2]);
    }
    for caps in ANGLE_RECIPIENT.captures_iter(header) {
        push_recipient(&mut recipients, &caps[1], &caps[2]);
    }
    recipients
}

fn push_recipient(out: &mut Vec<ParticipantCandidate>, raw_name: &str, raw_email: &str) {
    let name = raw_name.trim();
    if !is_valid_name(name) {
        debug!(name, "header recipient name rejected");
        return;
    }
    out.push(ParticipantCandidate {
        name: name.to_string(),
        email: address::clean(raw_email),
        department: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parenthesis_format() {
        let recipients = parse_recipients("To: Bob Roe (bob@x.com)");
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].name, "Bob Roe");
        assert_eq!(recipients[0].email.as_deref(), Some("bob@x.com"));
        assert_eq!(recipients[0].department, None);
    }

    #[test]
    fn test_angle_bracket_format() {
        let recipients = parse_recipients("To: Ann Smith <ann@x.com>");
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].name, "Ann Smith");
        assert_eq!(recipients[0].email.as_deref(), Some("ann@x.com"));
    }

    #[test]
    fn test_mixed_formats_each_extracted() {
        let header = "To: Bob Roe (bob@x.com)\nTo: Ann Smith <ann@x.com>";
        let recipients = parse_recipients(header);
        assert_eq!(recipients.len(), 2);
        // Parenthesis matches are collected before angle-bracket matches.
        assert_eq!(recipients[0].name, "Bob Roe");
        assert_eq!(recipients[1].name, "Ann Smith");
    }

    #[test]
    fn test_same_recipient_in_both_formats_yields_two_candidates() {
        let header = "To: Bob Roe (bob@x.com)\nTo: Bob Roe <bob@x.com>";
        let recipients = parse_recipients(header);
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].name, recipients[1].name);
    }

    #[test]
    fn test_from_lines_ignored() {
        assert!(parse_recipients("From: Jane Doe (jane@x.com)").is_empty());
    }

    #[test]
    fn test_invalid_address_dropped_but_name_kept() {
        let recipients = parse_recipients("To: Bob Roe (bob@nowhere)");
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].name, "Bob Roe");
        assert_eq!(recipients[0].email, None);
    }

    #[test]
    fn test_invalid_name_skips_entry_only() {
        let header = format!("To: {} (big@x.com)\nTo: Ann Smith <ann@x.com>", "x".repeat(120));
        let recipients = parse_recipients(&header);
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].name, "Ann Smith");
    }
}
