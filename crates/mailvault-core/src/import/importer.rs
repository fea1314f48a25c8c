//! Per-file import units over the reconciliation pipeline.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use mailvault_header::{parse_recipients, parse_sender};

use super::task::ImportTask;
use crate::db::Database;
use crate::discordance::{detect_recipients, detect_sender};
use crate::duplicates::DuplicateTracker;
use crate::email::{EmailRecord, EmailRecordBuilder, EmailRepository};
use crate::error::{Error, Result};
use crate::participant::{ParticipantRepository, ParticipantResolver};
use crate::record::{RawRecord, SequenceRef};
use crate::time::Clock;

const DEFAULT_WORKERS: usize = 4;

/// Outcome counts for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records fully imported.
    pub imported: usize,
    /// Records skipped for lack of a usable sender.
    pub skipped: usize,
    /// Records that failed to parse or persist.
    pub failed: usize,
}

enum FileOutcome {
    Imported,
    Skipped,
    Failed,
}

/// Runs import tasks against the archive.
///
/// Each input file is one unit of work; units run concurrently up to
/// the worker limit, and a failure in one never aborts its siblings.
#[derive(Clone)]
pub struct Importer {
    resolver: ParticipantResolver,
    emails: EmailRepository,
    duplicates: DuplicateTracker,
    clock: Arc<dyn Clock>,
    workers: usize,
}

impl Importer {
    /// Creates an importer over the shared archive database.
    #[must_use]
    pub fn new(db: &Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            resolver: ParticipantResolver::new(ParticipantRepository::new(db)),
            emails: EmailRepository::new(db),
            duplicates: DuplicateTracker::new(db),
            clock,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Sets the number of concurrent file workers.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Runs the task, one unit of work per file.
    ///
    /// Per-file failures are logged and counted; only the summary is
    /// returned.
    pub async fn run(&self, task: ImportTask) -> ImportSummary {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut units = JoinSet::new();

        for filename in task.files {
            if !filename.ends_with(".json") {
                continue;
            }
            let importer = self.clone();
            let path = task.directory.join(&filename);
            let semaphore = Arc::clone(&semaphore);
            units.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    // The semaphore lives as long as the run; this is
                    // unreachable short of an aborted runtime.
                    return FileOutcome::Failed;
                };
                importer.import_path(&path, &filename).await
            });
        }

        let mut summary = ImportSummary::default();
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(FileOutcome::Imported) => summary.imported += 1,
                Ok(FileOutcome::Skipped) => summary.skipped += 1,
                Ok(FileOutcome::Failed) => summary.failed += 1,
                Err(join_err) => {
                    error!(%join_err, "import unit panicked");
                    summary.failed += 1;
                }
            }
        }

        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            failed = summary.failed,
            "import run finished"
        );
        summary
    }

    async fn import_path(&self, path: &Path, filename: &str) -> FileOutcome {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(file = filename, %err, "failed to read export file");
                return FileOutcome::Failed;
            }
        };
        match self.import_file(filename, &bytes).await {
            Ok(_) => FileOutcome::Imported,
            Err(Error::NoValidSender { .. }) => FileOutcome::Skipped,
            Err(err) => {
                error!(file = filename, %err, "import failed");
                FileOutcome::Failed
            }
        }
    }

    /// Imports one export record.
    ///
    /// Steps inside the unit are strictly sequential: parse the JSON,
    /// resolve the sender from both sources, record discordance, build
    /// the email row with its links, then record duplicate references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed JSON,
    /// [`Error::NoValidSender`] when neither source yields a usable
    /// sender (the record is skipped whole, nothing persisted), or a
    /// database error.
    pub async fn import_file(&self, filename: &str, bytes: &[u8]) -> Result<EmailRecord> {
        let record: RawRecord = serde_json::from_slice(bytes)?;
        let seq_id = sequence_id(filename);

        let header_candidate = parse_sender(&record.text_header);

        // Header sender first: when both sources name the same person,
        // the header carries the address and department.
        let header_sender = match &header_candidate {
            Some(candidate) => self
                .resolver
                .resolve(
                    candidate.email.as_deref(),
                    &candidate.name,
                    candidate.department.as_deref(),
                )
                .await?
                .into_iter()
                .next(),
            None => None,
        };

        let json_sender = if record.sender.is_empty() {
            None
        } else {
            self.resolver
                .resolve(None, &record.sender, None)
                .await?
                .into_iter()
                .next()
        };

        if let (Some(header), Some(json)) = (&header_sender, &json_sender)
            && header.id != json.id
        {
            info!(
                file = filename,
                header_sender = %header.name,
                json_sender = %json.name,
                "sender sources resolved to different participants"
            );
        }

        // The structured sender wins when both are usable.
        let Some(sender) = json_sender.or(header_sender) else {
            warn!(
                file = filename,
                header = %record.text_header,
                json_sender = %record.sender,
                "no valid sender for record"
            );
            return Err(Error::NoValidSender {
                file: filename.to_string(),
            });
        };

        let sender_discordance = detect_sender(
            (!record.sender.is_empty()).then_some(record.sender.as_str()),
            header_candidate.as_ref(),
        );

        let header_recipients = parse_recipients(&record.text_header);
        let recipient_discordance = detect_recipients(&record.recipients_to, &header_recipients);

        let builder = EmailRecordBuilder::new(self.clock.as_ref());
        let new_email = builder.build(
            &record,
            &sender,
            filename,
            &seq_id,
            sender_discordance,
            recipient_discordance,
        );
        let email = self.emails.create(new_email).await?;

        // One link per participant, however many sources name them.
        let mut linked = HashSet::new();
        for candidate in &header_recipients {
            let participants = self
                .resolver
                .resolve(
                    candidate.email.as_deref(),
                    &candidate.name,
                    candidate.department.as_deref(),
                )
                .await?;
            for participant in participants {
                if linked.insert(participant.id) {
                    self.emails.add_recipient(email.id, participant.id, false).await?;
                }
            }
        }
        for json_recipient in &record.recipients_to {
            let name = json_recipient.trim();
            let name = if name.is_empty() { "Unknown" } else { name };
            for participant in self.resolver.resolve(None, name, None).await? {
                if linked.insert(participant.id) {
                    self.emails.add_recipient(email.id, participant.id, false).await?;
                }
            }
        }

        for attachment in &record.attachments {
            self.emails.add_attachment(email.id, attachment.trim()).await?;
        }

        let references: Vec<String> = record.duplicates.iter().map(SequenceRef::as_literal).collect();
        if record.canonical {
            self.duplicates.promote_canonical(&email, &references).await?;
        } else {
            for reference in &references {
                if let Err(err) = self.duplicates.link_duplicate(&email, reference).await {
                    warn!(file = filename, %err, "duplicate reference refused");
                }
            }
        }

        info!(file = filename, seq = %email.seq_id, "imported email record");
        Ok(email)
    }
}

/// Sequence id embedded in an export filename (`00042.json` → `00042`).
fn sequence_id(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map_or_else(|| filename.to_string(), |stem| stem.to_string_lossy().into_owned())
}
