//! Resolution of an incoming ledger against the current one.

use std::collections::HashSet;

use serde_json::Value;

use flatmoney_domain::{Ledger, UpsertOutcome};

use crate::{ledger_codec::decode_ledger_value, CoreError};

/// How an accepted import combines with the current ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportPolicy {
    /// The incoming ledger becomes the ledger.
    #[default]
    Replace,
    /// Incoming records win on matching ids; other current records are kept
    /// and new ones are appended in incoming order.
    MergeById,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub inserted: usize,
    pub replaced: usize,
    pub removed: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResolution {
    pub ledger: Ledger,
    pub stats: ImportStats,
}

pub struct ImportService;

impl ImportService {
    /// Validates `incoming` and computes the ledger that results from importing it.
    ///
    /// `current` is only read; on rejection the caller still holds it unchanged.
    pub fn resolve(
        current: &Ledger,
        incoming: Value,
        policy: ImportPolicy,
    ) -> Result<ImportResolution, CoreError> {
        let decoded = decode_ledger_value(incoming)
            .map_err(|err| CoreError::ImportValidation(err.to_string()))?;
        let incoming = decoded.ledger;
        let mut stats = ImportStats {
            warnings: decoded.warnings,
            ..ImportStats::default()
        };

        let ledger = match policy {
            ImportPolicy::Replace => {
                let incoming_ids: HashSet<&str> =
                    incoming.records().iter().map(|record| record.id()).collect();
                for record in current.records() {
                    if incoming_ids.contains(record.id()) {
                        stats.replaced += 1;
                    } else {
                        stats.removed += 1;
                    }
                }
                stats.inserted = incoming.len() - stats.replaced;
                incoming
            }
            ImportPolicy::MergeById => {
                let mut merged = current.clone();
                for record in incoming.into_records() {
                    match merged.upsert(record) {
                        UpsertOutcome::Inserted => stats.inserted += 1,
                        UpsertOutcome::Replaced => stats.replaced += 1,
                    }
                }
                merged
            }
        };

        tracing::info!(
            ?policy,
            inserted = stats.inserted,
            replaced = stats.replaced,
            removed = stats.removed,
            "resolved ledger import"
        );
        Ok(ImportResolution { ledger, stats })
    }

    pub fn resolve_str(
        current: &Ledger,
        incoming: &str,
        policy: ImportPolicy,
    ) -> Result<ImportResolution, CoreError> {
        let value: Value = serde_json::from_str(incoming)
            .map_err(|err| CoreError::ImportValidation(format!("not valid JSON: {err}")))?;
        Self::resolve(current, value, policy)
    }
}
