//! Shape checking between raw JSON and [`Ledger`] values.
//!
//! Both the durable record and import payloads go through [`decode_ledger_value`],
//! so a payload that would be rejected on import is also reported as corrupted
//! when found in storage.

use serde_json::Value;
use thiserror::Error;

use flatmoney_domain::{Ledger, MonthRecord};

use crate::CoreError;

/// A ledger decoded from JSON plus the notes produced while normalising it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLedger {
    pub ledger: Ledger,
    pub warnings: Vec<String>,
}

/// Why a JSON value is not a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("not valid JSON: {0}")]
    Malformed(String),
    #[error("expected an array of month records, found {0}")]
    NotASequence(&'static str),
    #[error("month record #{} is invalid: {reason}", .index + 1)]
    InvalidRecord { index: usize, reason: String },
    #[error("month record id `{0}` appears more than once")]
    DuplicateId(String),
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Checks `value` is an array of month records and builds the ledger from it.
///
/// Split parameters out of range are coerced and reported in `warnings`; any
/// other problem rejects the whole value.
pub fn decode_ledger_value(value: Value) -> Result<DecodedLedger, ShapeError> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(ShapeError::NotASequence(kind_of(&other))),
    };

    let mut warnings = Vec::new();
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let mut record: MonthRecord =
            serde_json::from_value(item).map_err(|err| ShapeError::InvalidRecord {
                index,
                reason: err.to_string(),
            })?;
        record
            .validate_stored()
            .map_err(|err| ShapeError::InvalidRecord {
                index,
                reason: err.to_string(),
            })?;
        warnings.extend(record.normalize());
        records.push(record);
    }

    let ledger = Ledger::try_from_records(records).map_err(|dup| ShapeError::DuplicateId(dup.0))?;
    Ok(DecodedLedger { ledger, warnings })
}

pub fn decode_ledger_str(raw: &str) -> Result<DecodedLedger, ShapeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| ShapeError::Malformed(err.to_string()))?;
    decode_ledger_value(value)
}

/// Serializes the ledger as the pretty-printed JSON array kept in storage.
pub fn encode_ledger(ledger: &Ledger) -> Result<String, CoreError> {
    serde_json::to_string_pretty(ledger).map_err(|err| CoreError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_json(id: &str) -> Value {
        json!({
            "id": id,
            "month": "Maio",
            "year": 2024,
            "revenue": 5000,
            "expenses": [{ "id": "e1", "description": "Luz", "amount": 120.5 }],
            "adminFeePercent": 35,
            "partnersCount": 2,
            "createdAt": 1_700_000_000_000_i64
        })
    }

    #[test]
    fn decodes_array_of_records() {
        let decoded = decode_ledger_value(json!([record_json("a"), record_json("b")])).unwrap();
        assert_eq!(decoded.ledger.len(), 2);
        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.ledger.records()[0].expenses()[0].amount().cents(), 12_050);
    }

    #[test]
    fn rejects_non_array() {
        assert_eq!(
            decode_ledger_value(json!({ "records": [] })).unwrap_err(),
            ShapeError::NotASequence("an object")
        );
        assert_eq!(
            decode_ledger_value(json!(42)).unwrap_err(),
            ShapeError::NotASequence("a number")
        );
    }

    #[test]
    fn rejects_record_missing_revenue() {
        let mut broken = record_json("b");
        broken.as_object_mut().unwrap().remove("revenue");
        let err = decode_ledger_value(json!([record_json("a"), broken])).unwrap_err();
        match err {
            ShapeError::InvalidRecord { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("revenue"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_stored_amount() {
        let mut broken = record_json("a");
        broken["expenses"][0]["amount"] = json!(-3);
        assert!(matches!(
            decode_ledger_value(json!([broken])),
            Err(ShapeError::InvalidRecord { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_sub_cent_stored_amount() {
        let mut broken = record_json("a");
        broken["revenue"] = json!(0.005);
        match decode_ledger_value(json!([broken])).unwrap_err() {
            ShapeError::InvalidRecord { index, reason } => {
                assert_eq!(index, 0);
                assert!(reason.contains("two decimal places"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = decode_ledger_value(json!([record_json("a"), record_json("a")])).unwrap_err();
        assert_eq!(err, ShapeError::DuplicateId("a".into()));
    }

    #[test]
    fn normalizes_legacy_split_parameters() {
        let mut legacy = record_json("a");
        legacy["partnersCount"] = json!(0);
        let decoded = decode_ledger_value(json!([legacy])).unwrap();
        assert_eq!(decoded.ledger.records()[0].partners_count(), 1);
        assert_eq!(decoded.warnings.len(), 1);
    }

    #[test]
    fn malformed_text_is_reported() {
        assert!(matches!(
            decode_ledger_str("[{"),
            Err(ShapeError::Malformed(_))
        ));
    }

    #[test]
    fn encoded_ledger_decodes_to_same_value() {
        let decoded = decode_ledger_value(json!([record_json("a")])).unwrap();
        let text = encode_ledger(&decoded.ledger).unwrap();
        assert_eq!(decode_ledger_str(&text).unwrap().ledger, decoded.ledger);
    }
}
