//! Find-or-create resolution of participant identities.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use mailvault_header::{address, is_valid_name};

use super::model::Participant;
use super::repository::ParticipantRepository;
use crate::Result;

static TRAILING_PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| pattern(r"^(.*?)\s*\(([^)]+)\)$"));
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| pattern(r"[^\p{L}\p{N}\s.'-]"));
static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| pattern(r"\s+"));

#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("hard-coded pattern compiles")
}

/// Resolves header- and JSON-supplied identities against the
/// participant store, creating rows on first sight.
#[derive(Debug, Clone)]
pub struct ParticipantResolver {
    repo: ParticipantRepository,
}

impl ParticipantResolver {
    /// Creates a resolver backed by the given repository.
    #[must_use]
    pub const fn new(repo: ParticipantRepository) -> Self {
        Self { repo }
    }

    /// Resolves every name in `raw_name` to a stored participant.
    ///
    /// A header field may join several people with `;`; each is
    /// resolved independently and the results are returned in order.
    /// Names that fail validation or clean down to nothing are
    /// skipped. A trailing parenthetical on a name is treated as a
    /// name-derived department and takes precedence over the
    /// `department` argument.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub async fn resolve(
        &self,
        email: Option<&str>,
        raw_name: &str,
        department: Option<&str>,
    ) -> Result<Vec<Participant>> {
        let mut resolved = Vec::new();
        for part in raw_name.split(';') {
            if let Some(participant) = self.resolve_one(email, part.trim(), department).await? {
                resolved.push(participant);
            }
        }
        Ok(resolved)
    }

    async fn resolve_one(
        &self,
        email: Option<&str>,
        raw_name: &str,
        supplied_department: Option<&str>,
    ) -> Result<Option<Participant>> {
        // The @/Subject: guard runs before cleanup: cleanup strips both
        // characters, and a name carrying them is a misfire, not a
        // participant.
        if !is_valid_name(raw_name) {
            debug!(name = raw_name, "skipping implausible participant name");
            return Ok(None);
        }

        let (stripped, name_department) = split_trailing_department(raw_name);
        let name = clean_name(&stripped);
        if name.is_empty() || name.chars().count() > 100 {
            return Ok(None);
        }

        let address = email.and_then(address::clean);

        if let Some(found) = self.repo.find_by_identity(&name, address.as_deref()).await? {
            let reconciled = self
                .reconcile_department(found, name_department.as_deref(), supplied_department)
                .await?;
            return Ok(Some(reconciled));
        }

        // First sight: create, falling back to a re-find when another
        // worker wins the race on the unique identity indexes.
        let department = name_department.as_deref().or(supplied_department);
        if let Some(created) = self
            .repo
            .create(&name, address.as_deref(), address.is_some(), department)
            .await?
        {
            return Ok(Some(created));
        }

        match self.repo.find_by_identity(&name, address.as_deref()).await? {
            Some(found) => {
                let reconciled = self
                    .reconcile_department(found, name_department.as_deref(), supplied_department)
                    .await?;
                Ok(Some(reconciled))
            }
            None => {
                warn!(name = %name, "identity conflict but no matching participant");
                Ok(None)
            }
        }
    }

    /// Department precedence: a name-derived tag overwrites a differing
    /// stored value; a caller-supplied tag only backfills an empty one.
    async fn reconcile_department(
        &self,
        mut participant: Participant,
        name_department: Option<&str>,
        supplied_department: Option<&str>,
    ) -> Result<Participant> {
        if let Some(tag) = name_department {
            if participant.department.as_deref() != Some(tag) {
                self.repo.update_department(participant.id, tag).await?;
                participant.department = Some(tag.to_string());
            }
        } else if let Some(tag) = supplied_department
            && participant.department.as_deref().unwrap_or("").is_empty()
        {
            self.repo.update_department(participant.id, tag).await?;
            participant.department = Some(tag.to_string());
        }
        Ok(participant)
    }
}

/// Splits a trailing `(<TAG>)` off a name; the tag is a name-derived
/// department.
fn split_trailing_department(name: &str) -> (String, Option<String>) {
    TRAILING_PARENTHETICAL.captures(name).map_or_else(
        || (name.to_string(), None),
        |caps| {
            let tag = caps[2].trim().to_string();
            (caps[1].to_string(), (!tag.is_empty()).then_some(tag))
        },
    )
}

/// Keeps letters (any script), digits, whitespace, periods,
/// apostrophes, and hyphens; collapses whitespace runs; trims.
fn clean_name(name: &str) -> String {
    let kept = DISALLOWED.replace_all(name, "");
    let collapsed = WHITESPACE_RUNS.replace_all(&kept, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn resolver() -> (ParticipantResolver, ParticipantRepository) {
        let db = Database::in_memory().await.unwrap();
        let repo = ParticipantRepository::new(&db);
        (ParticipantResolver::new(repo.clone()), repo)
    }

    #[test]
    fn test_clean_name_keeps_unicode_letters() {
        assert_eq!(clean_name("Žaneta  O'Brien-Nuñez Jr."), "Žaneta O'Brien-Nuñez Jr.");
        assert_eq!(clean_name("Doe, Jane"), "Doe Jane");
        assert_eq!(clean_name("  [redacted]  "), "redacted");
    }

    #[test]
    fn test_split_trailing_department() {
        assert_eq!(
            split_trailing_department("Jane Doe (LEGAL)"),
            ("Jane Doe".to_string(), Some("LEGAL".to_string()))
        );
        assert_eq!(split_trailing_department("Jane Doe"), ("Jane Doe".to_string(), None));
    }

    #[tokio::test]
    async fn test_resolving_twice_creates_one_row() {
        let (resolver, repo) = resolver().await;

        let first = resolver.resolve(Some("jane@x.com"), "Jane Doe", None).await.unwrap();
        let second = resolver.resolve(Some("jane@x.com"), "Jane Doe", None).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_email_only_match_reuses_participant() {
        let (resolver, repo) = resolver().await;

        let first = resolver.resolve(Some("jane@x.com"), "Jane Doe", None).await.unwrap();
        // Different spelling, same address: same identity.
        let second = resolver.resolve(Some("jane@x.com"), "J. Doe", None).await.unwrap();

        assert_eq!(first[0].id, second[0].id);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_semicolon_joined_names_resolve_in_order() {
        let (resolver, repo) = resolver().await;

        let resolved = resolver.resolve(None, "Jane Doe; Bob Roe", None).await.unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].name, "Jane Doe");
        assert_eq!(resolved[1].name, "Bob Roe");
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_implausible_names_never_become_participants() {
        let (resolver, repo) = resolver().await;

        assert!(resolver.resolve(None, "jane@x.com", None).await.unwrap().is_empty());
        assert!(
            resolver
                .resolve(None, "Jane Subject: hello", None)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            resolver
                .resolve(None, &"x".repeat(150), None)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(resolver.resolve(None, " ;; ", None).await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_name_derived_department_overwrites() {
        let (resolver, repo) = resolver().await;

        let created = resolver.resolve(None, "Jane Doe", Some("A")).await.unwrap();
        assert_eq!(created[0].department.as_deref(), Some("A"));

        let updated = resolver.resolve(None, "Jane Doe (B)", None).await.unwrap();
        assert_eq!(updated[0].department.as_deref(), Some("B"));

        let stored = repo.get(created[0].id).await.unwrap().unwrap();
        assert_eq!(stored.department.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_supplied_department_only_backfills() {
        let (resolver, repo) = resolver().await;

        let created = resolver.resolve(None, "Jane Doe", None).await.unwrap();
        assert_eq!(created[0].department, None);

        // Backfills an empty department.
        let filled = resolver.resolve(None, "Jane Doe", Some("C")).await.unwrap();
        assert_eq!(filled[0].department.as_deref(), Some("C"));

        // But never overwrites a set one.
        let unchanged = resolver.resolve(None, "Jane Doe", Some("D")).await.unwrap();
        assert_eq!(unchanged[0].department.as_deref(), Some("C"));

        let stored = repo.get(created[0].id).await.unwrap().unwrap();
        assert_eq!(stored.department.as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn test_invalid_address_not_stored() {
        let (resolver, _) = resolver().await;

        let resolved = resolver.resolve(Some("jane@nowhere"), "Jane Doe", None).await.unwrap();
        assert_eq!(resolved[0].email, None);
        assert!(!resolved[0].email_valid);
    }
}
