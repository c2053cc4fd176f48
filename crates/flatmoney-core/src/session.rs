//! The owned ledger of a running session and its link to durable storage.
//!
//! Every mutation goes through [`LedgerSession`]: the in-memory ledger changes
//! first and a save follows. A failed save never rolls the change back; the
//! session stays authoritative and the next mutation (or [`LedgerSession::flush`])
//! retries the write.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use flatmoney_domain::{Ledger, MonthLabel, MonthRecord, MonthRecordDraft};

use crate::{
    confirm::ConfirmAction,
    format::CurrencyFormatter,
    import_service::{ImportPolicy, ImportService, ImportStats},
    insight::InsightRequest,
    ledger_service::LedgerService,
    storage::LedgerStorage,
    summary_service::{LedgerTotals, MonthSummary, SummaryService},
    time::Clock,
    CoreError,
};

/// Result of a mutation that was applied to the in-memory ledger.
#[derive(Debug)]
pub struct MutationReport {
    pub record_id: Option<String>,
    /// Set when the follow-up save failed. The mutation itself still stands.
    pub write_error: Option<CoreError>,
}

impl MutationReport {
    pub fn persisted(&self) -> bool {
        self.write_error.is_none()
    }
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub stats: ImportStats,
    pub report: MutationReport,
}

pub struct LedgerSession {
    ledger: Ledger,
    storage: Box<dyn LedgerStorage>,
    clock: Box<dyn Clock>,
    last_saved: Option<DateTime<Utc>>,
    pending_write: bool,
    load_warnings: Vec<String>,
}

impl fmt::Debug for LedgerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerSession")
            .field("key", &self.storage.key())
            .field("records", &self.ledger.len())
            .field("last_saved", &self.last_saved)
            .field("pending_write", &self.pending_write)
            .finish()
    }
}

impl LedgerSession {
    /// Loads the ledger held by `storage`.
    ///
    /// A corrupted record hands the storage back inside [`CorruptedSession`] so
    /// the caller can retry or wipe; nothing is guessed from partial data.
    pub fn open(
        storage: Box<dyn LedgerStorage>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CorruptedSession> {
        match storage.load_ledger() {
            Ok(decoded) => {
                for warning in &decoded.warnings {
                    tracing::warn!(key = storage.key(), "{warning}");
                }
                tracing::info!(
                    key = storage.key(),
                    records = decoded.ledger.len(),
                    "ledger loaded"
                );
                Ok(Self {
                    ledger: decoded.ledger,
                    storage,
                    clock,
                    last_saved: None,
                    pending_write: false,
                    load_warnings: decoded.warnings,
                })
            }
            Err(error) => Err(CorruptedSession {
                error,
                storage,
                clock,
            }),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn record(&self, id: &str) -> Option<&MonthRecord> {
        self.ledger.get(id)
    }

    pub fn storage(&self) -> &dyn LedgerStorage {
        self.storage.as_ref()
    }

    /// Time of the last successful save made by this session.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// True while the durable record is behind the in-memory ledger.
    pub fn has_pending_write(&self) -> bool {
        self.pending_write
    }

    /// Notes about stored records that were coerced while loading.
    pub fn load_warnings(&self) -> &[String] {
        &self.load_warnings
    }

    /// A blank draft for the current calendar month.
    pub fn draft_for_today(&self) -> MonthRecordDraft {
        let (month, year) = self.clock.current_period();
        let month = MonthLabel::from_number(month).unwrap_or(MonthLabel::January);
        MonthRecordDraft::new(month, year)
    }

    pub fn create_record(&mut self, draft: MonthRecordDraft) -> Result<MutationReport, CoreError> {
        let id = LedgerService::create(&mut self.ledger, draft, self.clock.now_millis())?;
        tracing::info!(record = %id, "month record created");
        Ok(self.report(Some(id)))
    }

    pub fn edit_record(
        &mut self,
        id: &str,
        draft: MonthRecordDraft,
    ) -> Result<MutationReport, CoreError> {
        LedgerService::edit(&mut self.ledger, id, draft)?;
        tracing::info!(record = id, "month record updated");
        Ok(self.report(Some(id.to_string())))
    }

    /// Deletes record `id` once `confirm` approves. `Ok(None)` means it was declined.
    pub fn delete_record(
        &mut self,
        id: &str,
        confirm: &dyn ConfirmAction,
    ) -> Result<Option<MutationReport>, CoreError> {
        let label = self
            .ledger
            .get(id)
            .map(MonthRecord::display_label)
            .ok_or_else(|| CoreError::RecordNotFound(id.to_string()))?;
        if !confirm.confirm(&format!("Excluir o registro de {label}?")) {
            tracing::debug!(record = id, "delete declined");
            return Ok(None);
        }
        LedgerService::remove(&mut self.ledger, id)?;
        tracing::info!(record = id, "month record deleted");
        Ok(Some(self.report(Some(id.to_string()))))
    }

    /// Imports `incoming`. On rejection the ledger is left exactly as it was.
    pub fn import(
        &mut self,
        incoming: Value,
        policy: ImportPolicy,
    ) -> Result<ImportOutcome, CoreError> {
        let resolution = ImportService::resolve(&self.ledger, incoming, policy)?;
        for warning in &resolution.stats.warnings {
            tracing::warn!("{warning}");
        }
        self.ledger = resolution.ledger;
        Ok(ImportOutcome {
            stats: resolution.stats,
            report: self.report(None),
        })
    }

    pub fn summary(&self, id: &str) -> Option<MonthSummary> {
        self.ledger.get(id).map(SummaryService::summarize)
    }

    pub fn totals(&self) -> LedgerTotals {
        SummaryService::ledger_totals(&self.ledger)
    }

    /// Snapshot of record `id` for the insight collaborator.
    pub fn insight_request(
        &self,
        id: &str,
        formatter: &dyn CurrencyFormatter,
    ) -> Option<InsightRequest> {
        let record = self.ledger.get(id)?;
        let summary = SummaryService::summarize(record);
        Some(InsightRequest::from_record(record, &summary, formatter))
    }

    /// Retries a save left pending by an earlier failure.
    pub fn flush(&mut self) -> Result<(), CoreError> {
        if !self.pending_write {
            return Ok(());
        }
        match self.persist() {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Clears the durable record once `confirm` approves, then loads afresh.
    pub fn reset(&mut self, confirm: &dyn ConfirmAction) -> Result<bool, CoreError> {
        if !confirm.confirm("Apagar todos os registros? Esta ação não pode ser desfeita.") {
            return Ok(false);
        }
        self.storage.clear()?;
        tracing::info!(key = self.storage.key(), "ledger storage cleared");
        self.reload()?;
        Ok(true)
    }

    /// Replaces the in-memory ledger with what storage currently holds.
    pub fn reload(&mut self) -> Result<(), CoreError> {
        let decoded = self.storage.load_ledger()?;
        self.ledger = decoded.ledger;
        self.load_warnings = decoded.warnings;
        self.pending_write = false;
        Ok(())
    }

    fn report(&mut self, record_id: Option<String>) -> MutationReport {
        MutationReport {
            record_id,
            write_error: self.persist(),
        }
    }

    fn persist(&mut self) -> Option<CoreError> {
        match self.storage.save_ledger(&self.ledger) {
            Ok(()) => {
                let now = self.clock.now();
                self.last_saved = Some(now);
                self.pending_write = false;
                tracing::info!(
                    key = self.storage.key(),
                    records = self.ledger.len(),
                    saved_at = %now,
                    "ledger saved"
                );
                None
            }
            Err(err) => {
                self.pending_write = true;
                tracing::warn!(
                    key = self.storage.key(),
                    error = %err,
                    "ledger save failed; keeping in-memory state"
                );
                Some(err)
            }
        }
    }
}

/// A session that could not start because the stored ledger is corrupted.
pub struct CorruptedSession {
    error: CoreError,
    storage: Box<dyn LedgerStorage>,
    clock: Box<dyn Clock>,
}

impl fmt::Debug for CorruptedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorruptedSession")
            .field("key", &self.storage.key())
            .field("error", &self.error)
            .finish()
    }
}

impl CorruptedSession {
    pub fn error(&self) -> &CoreError {
        &self.error
    }

    pub fn storage(&self) -> &dyn LedgerStorage {
        self.storage.as_ref()
    }

    pub fn into_error(self) -> CoreError {
        self.error
    }

    /// Loads again, for when the record was repaired or restored out of band.
    pub fn retry(self) -> Result<LedgerSession, CorruptedSession> {
        LedgerSession::open(self.storage, self.clock)
    }

    /// Discards the stored record and starts from an empty ledger.
    pub fn wipe_and_restart(self) -> Result<LedgerSession, CoreError> {
        self.storage.clear()?;
        tracing::warn!(key = self.storage.key(), "corrupted ledger wiped");
        LedgerSession::open(self.storage, self.clock).map_err(CorruptedSession::into_error)
    }
}
