//! Migration orchestrator
//!
//! Drives the end-to-end history import for one user or a batch of users:
//! authenticate once against Nova, then per user resolve the local row,
//! locate the exact legacy account, paginate its event applications, fetch
//! and filter each referenced event, and upsert shift types, shifts and
//! signups idempotently, emitting progress events throughout.
//!
//! Processing is strictly sequential (user by user, page by page, event by
//! event) and retry-free: a failed page, event or user is recorded and
//! skipped, never re-attempted. Errors are scoped to the smallest unit that
//! failed; only a Nova authentication failure aborts a batch.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::StoreError;
use crate::import::status::should_import;
use crate::import::transform::{TransformError, transform_event, transform_signup, transform_user};
use crate::nova::{NovaClient, NovaCredentials, NovaError, NovaResource};
use crate::progress::{ProgressEvent, ProgressRegistry};
use crate::repositories::{HistoryStore, NewShift};

const STAGE_AUTH: &str = "authenticating";
const STAGE_RESOLVE: &str = "resolving_user";
const STAGE_APPLICATIONS: &str = "fetching_applications";
const STAGE_EVENTS: &str = "importing_events";
const STAGE_DONE: &str = "completed";

/// Options controlling one import invocation.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(default)]
pub struct ImportOptions {
    /// Run every decision but perform zero writes; counts reflect what
    /// would have been imported
    pub dry_run: bool,
    /// Create shift types and shifts for legacy events
    pub include_shifts: bool,
    /// Create signups for surviving applications
    pub include_signups: bool,
    /// Create local users that have a matching legacy account but no local
    /// row yet
    pub create_missing_users: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            include_shifts: true,
            include_signups: true,
            create_missing_users: true,
        }
    }
}

/// Terminal state of one user's import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserImportStatus {
    /// History found and imported (or previewed, in a dry run)
    ImportedHistory,
    /// Legacy account matched but has no event applications
    NoHistory,
    /// No local user and creation was disabled
    SkippedNotFoundLocally,
    /// No legacy account with exactly this email
    SkippedNotFoundRemotely,
    /// An error escaped this user's processing
    Failed,
}

/// Per-user outcome within a batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserImportResult {
    pub email: String,
    pub status: UserImportStatus,
    /// Whether a local user row was created (or would be, in a dry run)
    pub user_created: bool,
    pub shifts_imported: u32,
    pub signups_imported: u32,
    /// Event-scoped error strings; non-empty errors do not imply failure
    pub errors: Vec<String>,
}

impl UserImportResult {
    fn new(email: &str, status: UserImportStatus) -> Self {
        Self {
            email: email.to_string(),
            status,
            user_created: false,
            shifts_imported: 0,
            signups_imported: 0,
            errors: Vec::new(),
        }
    }
}

/// Aggregate outcome of a batch.
///
/// `success` means the batch ran to completion; it stays `true` even when
/// every individual user failed. Callers must inspect `errors` and
/// `user_results` for the real outcome.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchImportSummary {
    pub success: bool,
    pub dry_run: bool,
    pub users_processed: u32,
    pub shifts_imported: u32,
    pub signups_imported: u32,
    /// Batch-level errors (currently only authentication failure)
    pub errors: Vec<String>,
    pub user_results: Vec<UserImportResult>,
}

/// Error internal to one user's processing. Never escapes the per-user
/// boundary; the variants exist so event- and user-level handling can tell
/// the sources apart.
#[derive(Debug, Error)]
enum ImportError {
    #[error(transparent)]
    Nova(#[from] NovaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Orchestrates history imports against an injected store and progress
/// registry.
pub struct HistoryImporter {
    store: Arc<dyn HistoryStore>,
    progress: Arc<ProgressRegistry>,
}

impl HistoryImporter {
    pub fn new(store: Arc<dyn HistoryStore>, progress: Arc<ProgressRegistry>) -> Self {
        Self { store, progress }
    }

    /// Run a batch import for the given target emails.
    ///
    /// Authenticates once; an authentication failure is the only condition
    /// that fails the batch as a whole.
    #[instrument(skip(self, credentials, emails), fields(targets = emails.len(), dry_run = options.dry_run))]
    pub async fn run_batch(
        &self,
        credentials: &NovaCredentials,
        emails: &[String],
        options: ImportOptions,
        session_id: Option<&str>,
    ) -> BatchImportSummary {
        let started = Instant::now();
        let mut summary = BatchImportSummary {
            success: true,
            dry_run: options.dry_run,
            users_processed: 0,
            shifts_imported: 0,
            signups_imported: 0,
            errors: Vec::new(),
            user_results: Vec::new(),
        };

        self.publish(
            session_id,
            ProgressEvent::info(
                STAGE_AUTH,
                format!("Authenticating against {}", credentials.base_url),
            ),
        );

        let client = match NovaClient::authenticate(credentials).await {
            Ok(client) => client,
            Err(err) => {
                warn!("Nova authentication failed: {}", err);
                counter!("nova_import_auth_failures_total").increment(1);
                self.publish(
                    session_id,
                    ProgressEvent::error(STAGE_AUTH, format!("Authentication failed: {}", err)),
                );
                summary.success = false;
                summary.errors.push(format!("{}", err));
                return summary;
            }
        };

        info!("Authenticated against Nova, importing {} users", emails.len());

        // One clock sample for the whole batch keeps the past/future
        // decision stable across users.
        let now = Utc::now();

        for email in emails {
            let result = self.import_user(&client, email, options, session_id, now).await;

            summary.users_processed += 1;
            summary.shifts_imported += result.shifts_imported;
            summary.signups_imported += result.signups_imported;
            summary.user_results.push(result);
        }

        self.publish(
            session_id,
            ProgressEvent::new(
                "completed",
                STAGE_DONE,
                format!(
                    "Batch finished: {} users, {} shifts, {} signups",
                    summary.users_processed, summary.shifts_imported, summary.signups_imported
                ),
            )
            .with_counts(summary.shifts_imported, summary.signups_imported),
        );

        histogram!("nova_import_batch_duration_seconds").record(started.elapsed().as_secs_f64());
        counter!("nova_import_shifts_imported_total").increment(summary.shifts_imported as u64);
        counter!("nova_import_signups_imported_total").increment(summary.signups_imported as u64);

        summary
    }

    /// Import one user, catching everything that escapes the inner pipeline
    /// so a failure never aborts the rest of the batch.
    #[instrument(skip(self, client, options, session_id, now), fields(email = %email))]
    async fn import_user(
        &self,
        client: &NovaClient,
        email: &str,
        options: ImportOptions,
        session_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> UserImportResult {
        let started = Instant::now();

        self.publish(
            session_id,
            ProgressEvent::new("user_started", STAGE_RESOLVE, format!("Importing {}", email)),
        );

        let result = match self.import_user_inner(client, email, options, session_id, now).await {
            Ok(result) => result,
            Err(err) => {
                warn!("Import failed for {}: {}", email, err);
                let mut failed = UserImportResult::new(email, UserImportStatus::Failed);
                failed.errors.push(format!("{}", err));
                self.publish(
                    session_id,
                    ProgressEvent::error(STAGE_RESOLVE, format!("{}: import failed: {}", email, err)),
                );
                failed
            }
        };

        histogram!("nova_import_user_duration_seconds").record(started.elapsed().as_secs_f64());
        counter!(
            "nova_import_users_total",
            "status" => status_label(result.status)
        )
        .increment(1);

        self.publish(
            session_id,
            ProgressEvent::new(
                "user_completed",
                STAGE_DONE,
                format!(
                    "{}: {} ({} shifts, {} signups)",
                    email,
                    status_label(result.status),
                    result.shifts_imported,
                    result.signups_imported
                ),
            )
            .with_counts(result.shifts_imported, result.signups_imported),
        );

        result
    }

    async fn import_user_inner(
        &self,
        client: &NovaClient,
        email: &str,
        options: ImportOptions,
        session_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<UserImportResult, ImportError> {
        let local_user = self.store.find_user_by_email(email).await?;
        if local_user.is_none() && !options.create_missing_users {
            self.publish(
                session_id,
                ProgressEvent::info(STAGE_RESOLVE, format!("{}: no local user", email)),
            );
            return Ok(UserImportResult::new(
                email,
                UserImportStatus::SkippedNotFoundLocally,
            ));
        }

        // The legacy search endpoint does substring matching; only a
        // case-insensitive exact email match counts as the same person.
        let candidates = client.search_users(email).await?;
        let candidate_count = candidates.len();
        let legacy_user = candidates.into_iter().find(|candidate| {
            candidate
                .str_field("email")
                .is_some_and(|candidate_email| candidate_email.eq_ignore_ascii_case(email))
        });

        let Some(legacy_user) = legacy_user else {
            debug!(
                "No exact legacy match for {} among {} candidates",
                email, candidate_count
            );
            self.publish(
                session_id,
                ProgressEvent::info(STAGE_RESOLVE, format!("{}: no legacy account found", email)),
            );
            return Ok(UserImportResult::new(
                email,
                UserImportStatus::SkippedNotFoundRemotely,
            ));
        };

        let (user_id, user_created) = match local_user {
            Some(user) => (user.id, false),
            None => {
                let draft = transform_user(&legacy_user, client).await?;
                let id = if options.dry_run {
                    Uuid::new_v4()
                } else {
                    self.store.create_user(draft).await?.id
                };
                info!("Created local user for {}", email);
                (id, true)
            }
        };

        let applications = self.collect_applications(client, legacy_user.id).await?;
        self.publish(
            session_id,
            ProgressEvent::info(
                STAGE_APPLICATIONS,
                format!("{}: {} legacy applications", email, applications.len()),
            ),
        );

        if applications.is_empty() {
            let mut result = UserImportResult::new(email, UserImportStatus::NoHistory);
            result.user_created = user_created;
            return Ok(result);
        }

        // Group by referenced event; applications without an event
        // reference are unusable. BTreeMap keeps event order stable.
        let mut by_event: BTreeMap<i64, Vec<NovaResource>> = BTreeMap::new();
        for application in applications {
            match application.belongs_to("event") {
                Some(event_id) => by_event.entry(event_id).or_default().push(application),
                None => debug!(
                    "Application {} for {} has no event reference, dropping",
                    application.id, email
                ),
            }
        }

        let mut result = UserImportResult::new(email, UserImportStatus::ImportedHistory);
        result.user_created = user_created;

        for (event_id, applications) in by_event {
            match self
                .import_event(client, event_id, &applications, user_id, options, now)
                .await
            {
                Ok(Some((shifts, signups))) => {
                    result.shifts_imported += shifts;
                    result.signups_imported += signups;
                    self.publish(
                        session_id,
                        ProgressEvent::info(
                            STAGE_EVENTS,
                            format!("{}: imported event {}", email, event_id),
                        )
                        .with_counts(result.shifts_imported, result.signups_imported),
                    );
                }
                Ok(None) => {
                    self.publish(
                        session_id,
                        ProgressEvent::new(
                            "event_skipped",
                            STAGE_EVENTS,
                            format!("{}: skipped event {}", email, event_id),
                        ),
                    );
                }
                Err(err) => {
                    // Persistence trouble on one event is recorded and the
                    // remaining events still run.
                    warn!("Event {} failed for {}: {}", event_id, email, err);
                    result.errors.push(format!("event {}: {}", event_id, err));
                }
            }
        }

        Ok(result)
    }

    /// Collect every page of the legacy user's event applications.
    ///
    /// A page with zero resources ends pagination even when a next-page
    /// cursor is still present, since malformed pagination metadata must not
    /// loop forever.
    async fn collect_applications(
        &self,
        client: &NovaClient,
        legacy_user_id: i64,
    ) -> Result<Vec<NovaResource>, NovaError> {
        let mut collected = Vec::new();
        let mut page = client.event_applications(legacy_user_id).await?;

        loop {
            if page.resources.is_empty() {
                break;
            }
            collected.append(&mut page.resources);

            let Some(url) = page.next_page_url else {
                break;
            };
            page = client.next_page(&url).await?;
        }

        Ok(collected)
    }

    /// Import one legacy event and the user's surviving applications on it.
    ///
    /// Returns `Ok(None)` for recoverable skips (fetch failure, malformed
    /// event, nothing survives filtering); these are expected data-quality
    /// gaps in a legacy export, logged but not surfaced as user errors.
    async fn import_event(
        &self,
        client: &NovaClient,
        event_id: i64,
        applications: &[NovaResource],
        user_id: Uuid,
        options: ImportOptions,
        now: DateTime<Utc>,
    ) -> Result<Option<(u32, u32)>, ImportError> {
        let event = match client.fetch_event(event_id).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                warn!("Event {} returned an empty resource, skipping", event_id);
                return Ok(None);
            }
            Err(err) => {
                warn!("Event {} fetch failed, skipping: {}", event_id, err);
                return Ok(None);
            }
        };

        // The filter requires a date; a dateless event excludes all of its
        // applications and the event is skipped below.
        let event_instant = event.date_field("date").map(|d| {
            d.and_time(chrono::NaiveTime::MIN).and_utc()
        });

        let surviving: Vec<&NovaResource> = applications
            .iter()
            .filter(|application| {
                should_import(
                    event_instant,
                    application.belongs_to("application_status"),
                    application.str_field("application_status"),
                    now,
                )
            })
            .collect();

        if surviving.is_empty() {
            debug!("Event {}: no surviving applications", event_id);
            return Ok(None);
        }

        let positions: Vec<Option<String>> = surviving
            .iter()
            .map(|application| application.str_field("position").map(str::to_string))
            .collect();

        let (shift_id, shifts_imported) = if options.include_shifts {
            let draft = match transform_event(&event, &positions) {
                Ok(draft) => draft,
                Err(err) => {
                    warn!("Event {} is malformed, skipping: {}", event_id, err);
                    return Ok(None);
                }
            };

            let shift_type_id = self.resolve_shift_type(&draft.type_name, options).await?;

            match self.store.find_shift_by_legacy_event(event_id).await? {
                Some(existing) => (existing.id, 0),
                None if options.dry_run => (Uuid::new_v4(), 1),
                None => {
                    let shift = self
                        .store
                        .create_shift(NewShift {
                            shift_type_id,
                            starts_at: draft.starts_at,
                            ends_at: draft.ends_at,
                            capacity: draft.capacity,
                            location: draft.location,
                            notes: Some(draft.notes),
                            legacy_event_id: Some(draft.legacy_event_id),
                        })
                        .await?;
                    (shift.id, 1)
                }
            }
        } else {
            // Shift creation disabled: only events that already have a
            // local shift can receive signups.
            match self.store.find_shift_by_legacy_event(event_id).await? {
                Some(existing) => (existing.id, 0),
                None => {
                    debug!(
                        "Event {}: shift creation disabled and no local shift exists",
                        event_id
                    );
                    return Ok(None);
                }
            }
        };

        let signups_imported = if options.include_signups {
            self.import_signup(&surviving, user_id, shift_id, options)
                .await?
        } else {
            0
        };

        Ok(Some((shifts_imported, signups_imported)))
    }

    async fn resolve_shift_type(
        &self,
        name: &str,
        options: ImportOptions,
    ) -> Result<Uuid, ImportError> {
        if let Some(existing) = self.store.find_shift_type_by_name(name).await? {
            return Ok(existing.id);
        }

        if options.dry_run {
            return Ok(Uuid::new_v4());
        }

        Ok(self.store.create_shift_type(name).await?.id)
    }

    /// Find-or-create the user's signup on a shift.
    ///
    /// All applications in an event group belong to the same (user, shift)
    /// pair, so at most one row can ever result; duplicates (correction
    /// re-submissions) collapse onto the most recently updated application.
    async fn import_signup(
        &self,
        surviving: &[&NovaResource],
        user_id: Uuid,
        shift_id: Uuid,
        options: ImportOptions,
    ) -> Result<u32, ImportError> {
        if self.store.find_signup(user_id, shift_id).await?.is_some() {
            return Ok(0);
        }

        let Some(representative) = representative_application(surviving) else {
            return Ok(0);
        };

        if !options.dry_run {
            let new_signup = transform_signup(representative, user_id, shift_id);
            self.store.create_signup(new_signup).await?;
        }

        Ok(1)
    }

    fn publish(&self, session_id: Option<&str>, event: ProgressEvent) {
        if let Some(session_id) = session_id {
            self.progress.publish(session_id, event);
        }
    }
}

/// Pick the application whose signup row should represent the (user, shift)
/// pair: the most recently updated one, falling back to creation time, then
/// input order.
fn representative_application<'a>(applications: &[&'a NovaResource]) -> Option<&'a NovaResource> {
    applications
        .iter()
        .enumerate()
        .max_by_key(|(index, application)| {
            (
                application
                    .datetime_field("updated_at")
                    .or_else(|| application.datetime_field("created_at")),
                // Later submissions win ties.
                *index,
            )
        })
        .map(|(_, application)| *application)
}

fn status_label(status: UserImportStatus) -> &'static str {
    match status {
        UserImportStatus::ImportedHistory => "imported_history",
        UserImportStatus::NoHistory => "no_history",
        UserImportStatus::SkippedNotFoundLocally => "skipped_not_found_locally",
        UserImportStatus::SkippedNotFoundRemotely => "skipped_not_found_remotely",
        UserImportStatus::Failed => "failed",
    }
}
