//! Sender extraction: ordered `From:` format matchers.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::address;
use crate::candidate::{ParticipantCandidate, is_valid_name};
use crate::pattern;

/// Outcome of trying one header format.
enum MatchOutcome {
    /// The format matched and produced an acceptable candidate.
    Matched(ParticipantCandidate),
    /// The format matched structurally but the name failed validation.
    Rejected,
    /// The format did not match.
    NoMatch,
}

/// One named format in the priority order.
struct SenderFormat {
    name: &'static str,
    apply: fn(&str) -> MatchOutcome,
}

/// `From: <name> (<DEPT>)` at end of line or followed by `Sent:`.
///
/// The parenthetical must not contain `@`: an address in that position
/// belongs to the email-first format, not a department tag.
static DEPT_ONLY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?m)From:\s*([^(]+?)\s*\(([^)@]+)\)\s*(?:$|Sent:)"));

/// `From: <name> (<DEPT>) (<email>)`.
static DEPT_THEN_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"From:\s*([^(]+?)\s*\(([^)]+)\)\s*\(([^)]+@[^)]+)\)"));

/// `From: <name> (<email>) (<DEPT>)?`, department optional.
static EMAIL_THEN_DEPT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"From:\s*([^(]+?)\s*\(([^)]+@[^)]+)\)\s*(?:\(([^)]+)\))?"));

/// `From: <name> <<email>>`.
static ANGLE_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"From:\s*([^<]+?)\s*<([^>]+@[^>]+)>"));

const SENDER_FORMATS: [SenderFormat; 4] = [
    SenderFormat {
        name: "dept-only",
        apply: dept_only,
    },
    SenderFormat {
        name: "dept-then-email",
        apply: dept_then_email,
    },
    SenderFormat {
        name: "email-then-dept",
        apply: email_then_dept,
    },
    SenderFormat {
        name: "angle-bracket",
        apply: angle_bracket,
    },
];

/// Extracts the sender identity from a free-text header block.
///
/// Formats are tried in a fixed priority order and the first match
/// wins. A header with no recognizable `From:` form yields `None`, as
/// does a structural match whose name fails validation (see
/// [`is_valid_name`]).
#[must_use]
pub fn parse_sender(header: &str) -> Option<ParticipantCandidate> {
    for format in &SENDER_FORMATS {
        match (format.apply)(header) {
            MatchOutcome::Matched(candidate) => {
                debug!(format = format.name, name = %candidate.name, "header sender matched");
                return Some(candidate);
            }
            MatchOutcome::Rejected => {
                debug!(format = format.name, "header sender name rejected");
                return None;
            }
            MatchOutcome::NoMatch => {}
        }
    }
    None
}

fn dept_only(header: &str) -> MatchOutcome {
    DEPT_ONLY.captures(header).map_or(MatchOutcome::NoMatch, |caps| {
        build(&caps[1], None, Some(&caps[2]))
    })
}

fn dept_then_email(header: &str) -> MatchOutcome {
    DEPT_THEN_EMAIL
        .captures(header)
        .map_or(MatchOutcome::NoMatch, |caps| {
            build(&caps[1], Some(&caps[3]), Some(&caps[2]))
        })
}

fn email_then_dept(header: &str) -> MatchOutcome {
    EMAIL_THEN_DEPT
        .captures(header)
        .map_or(MatchOutcome::NoMatch, |caps| {
            build(
                &caps[1],
                Some(&caps[2]),
                caps.get(3).map(|dept| dept.as_str()),
            )
        })
}

fn angle_bracket(header: &str) -> MatchOutcome {
    ANGLE_BRACKET
        .captures(header)
        .map_or(MatchOutcome::NoMatch, |caps| {
            build(&caps[1], Some(&caps[2]), None)
        })
}

/// Builds a candidate from raw captures.
///
/// An invalid name rejects the candidate outright; an invalid address
/// is dropped without discarding the name or department.
fn build(raw_name: &str, raw_email: Option<&str>, raw_department: Option<&str>) -> MatchOutcome {
    let name = raw_name.trim();
    if !is_valid_name(name) {
        return MatchOutcome::Rejected;
    }
    MatchOutcome::Matched(ParticipantCandidate {
        name: name.to_string(),
        email: raw_email.and_then(address::clean),
        department: raw_department
            .map(str::trim)
            .filter(|dept| !dept.is_empty())
            .map(ToString::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dept_only_at_end_of_line() {
        let sender = parse_sender("From: Jane Doe (LEGAL)\nTo: Bob Roe (bob@x.com)").unwrap();
        assert_eq!(sender.name, "Jane Doe");
        assert_eq!(sender.email, None);
        assert_eq!(sender.department.as_deref(), Some("LEGAL"));
    }

    #[test]
    fn test_dept_only_followed_by_sent() {
        let sender = parse_sender("From: Jane Doe (LEGAL) Sent: Monday 9am").unwrap();
        assert_eq!(sender.name, "Jane Doe");
        assert_eq!(sender.email, None);
        assert_eq!(sender.department.as_deref(), Some("LEGAL"));
    }

    #[test]
    fn test_dept_then_email() {
        let sender = parse_sender("From: Jane Doe (LEGAL) (jane@x.com)\nTo: Bob").unwrap();
        assert_eq!(sender.name, "Jane Doe");
        assert_eq!(sender.email.as_deref(), Some("jane@x.com"));
        assert_eq!(sender.department.as_deref(), Some("LEGAL"));
    }

    #[test]
    fn test_email_then_dept() {
        let sender = parse_sender("From: Jane Doe (jane@x.com) (LEGAL) said hi").unwrap();
        assert_eq!(sender.name, "Jane Doe");
        assert_eq!(sender.email.as_deref(), Some("jane@x.com"));
        assert_eq!(sender.department.as_deref(), Some("LEGAL"));
    }

    #[test]
    fn test_email_without_dept_at_end_of_line_is_not_a_department() {
        // The dept-only format must not swallow an address-in-parentheses.
        let sender = parse_sender("From: Jane Doe (jane@x.com)\nTo: Bob Roe (bob@x.com)").unwrap();
        assert_eq!(sender.name, "Jane Doe");
        assert_eq!(sender.email.as_deref(), Some("jane@x.com"));
        assert_eq!(sender.department, None);
    }

    #[test]
    fn test_angle_bracket() {
        let sender = parse_sender("From: Jane Doe <jane@x.com>").unwrap();
        assert_eq!(sender.name, "Jane Doe");
        assert_eq!(sender.email.as_deref(), Some("jane@x.com"));
        assert_eq!(sender.department, None);
    }

    #[test]
    fn test_no_from_line() {
        assert_eq!(parse_sender("To: Bob Roe (bob@x.com)"), None);
        assert_eq!(parse_sender(""), None);
    }

    #[test]
    fn test_invalid_address_dropped_but_name_kept() {
        let sender = parse_sender("From: Jane Doe (jane@nowhere) (LEGAL)").unwrap();
        assert_eq!(sender.name, "Jane Doe");
        assert_eq!(sender.email, None);
        assert_eq!(sender.department.as_deref(), Some("LEGAL"));
    }

    #[test]
    fn test_swallowed_subject_line_rejects_candidate() {
        let header = "From: Subject: Q3 results and more words here <jane@x.com>";
        assert_eq!(parse_sender(header), None);
    }

    #[test]
    fn test_over_long_name_rejects_candidate() {
        let header = format!("From: {} (LEGAL)", "x".repeat(120));
        assert_eq!(parse_sender(&header), None);
    }
}
