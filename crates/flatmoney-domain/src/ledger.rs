//! The ordered collection of month records kept for a property.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::record::MonthRecord;

/// Ordered month records, unique by `id`. Serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MonthRecord>", into = "Vec<MonthRecord>")]
pub struct Ledger {
    records: Vec<MonthRecord>,
}

/// Whether [`Ledger::upsert`] added a record or replaced one in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from records in the given order, rejecting repeated ids.
    pub fn try_from_records(records: Vec<MonthRecord>) -> Result<Self, DuplicateRecordId> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id()) {
                return Err(DuplicateRecordId(record.id().to_string()));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[MonthRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MonthRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MonthRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Replaces the record with the same id in place, or appends it.
    pub fn upsert(&mut self, record: MonthRecord) -> UpsertOutcome {
        match self.records.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(existing) => {
                *existing = record;
                UpsertOutcome::Replaced
            }
            None => {
                self.records.push(record);
                UpsertOutcome::Inserted
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<MonthRecord> {
        let index = self.records.iter().position(|record| record.id() == id)?;
        Some(self.records.remove(index))
    }

    /// Records ordered by year, month and then creation time.
    pub fn chronological(&self) -> Vec<&MonthRecord> {
        let mut ordered: Vec<&MonthRecord> = self.records.iter().collect();
        ordered.sort_by_key(|record| record.period_key());
        ordered
    }

    /// Distinct years present in the ledger, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(MonthRecord::year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

impl TryFrom<Vec<MonthRecord>> for Ledger {
    type Error = DuplicateRecordId;

    fn try_from(records: Vec<MonthRecord>) -> Result<Self, Self::Error> {
        Self::try_from_records(records)
    }
}

impl From<Ledger> for Vec<MonthRecord> {
    fn from(ledger: Ledger) -> Self {
        ledger.records
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecordId(pub String);

impl fmt::Display for DuplicateRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate month record id `{}`", self.0)
    }
}

impl std::error::Error for DuplicateRecordId {}
