//! Create, edit and delete operations on an owned [`Ledger`].

use flatmoney_domain::{Ledger, MonthRecord, MonthRecordDraft, RecordIdentity};

use crate::CoreError;

/// Applies the entity rules when month records enter or leave a ledger.
pub struct LedgerService;

impl LedgerService {
    /// Builds a new record from `draft` under a fresh identity and appends it.
    pub fn create(
        ledger: &mut Ledger,
        draft: MonthRecordDraft,
        created_at: i64,
    ) -> Result<String, CoreError> {
        let record = draft.into_record(RecordIdentity::fresh(created_at))?;
        let id = record.id().to_string();
        ledger.upsert(record);
        Ok(id)
    }

    /// Replaces the content of record `id`, keeping its id and creation time.
    pub fn edit(ledger: &mut Ledger, id: &str, draft: MonthRecordDraft) -> Result<(), CoreError> {
        let identity = ledger
            .get(id)
            .map(MonthRecord::identity)
            .ok_or_else(|| CoreError::RecordNotFound(id.to_string()))?;
        let record = draft.into_record(identity)?;
        ledger.upsert(record);
        Ok(())
    }

    pub fn remove(ledger: &mut Ledger, id: &str) -> Result<MonthRecord, CoreError> {
        ledger
            .remove(id)
            .ok_or_else(|| CoreError::RecordNotFound(id.to_string()))
    }
}
