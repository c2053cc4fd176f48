use serde_json::{json, Value};

use flatmoney_core::{
    format, parse_digits, reformat_on_keystroke, CoreError, ImportPolicy, ImportService,
    LedgerStorage, LocaleConfig, MemoryLedgerStorage,
};
use flatmoney_domain::{Ledger, Money};

fn record(id: &str, month: &str, revenue: Value, partners: i64) -> Value {
    json!({
        "id": id,
        "month": month,
        "year": 2024,
        "revenue": revenue,
        "expenses": [
            { "id": format!("{id}-e1"), "description": "Condomínio", "amount": 1200 },
            { "id": format!("{id}-e2"), "description": "Internet", "amount": 99.9 }
        ],
        "adminFeePercent": 35,
        "partnersCount": partners,
        "createdAt": 1_700_000_000_000_i64
    })
}

fn sample_ledgers() -> Vec<Ledger> {
    vec![
        Ledger::new(),
        serde_json::from_value(json!([record("a", "Janeiro", json!(5000), 2)])).unwrap(),
        serde_json::from_value(json!([
            record("a", "Janeiro", json!(5000), 2),
            record("b", "Fevereiro", json!(4100.5), 3),
            record("c", "Março", json!(0), 1)
        ]))
        .unwrap(),
    ]
}

#[test]
fn valid_import_replaces_any_current_ledger() {
    let incoming_values = vec![
        json!([]),
        json!([record("z", "Dezembro", json!(7000), 2)]),
        json!([
            record("b", "Abril", json!(1.01), 4),
            record("y", "Maio", json!(3000), 1)
        ]),
    ];
    for current in sample_ledgers() {
        for incoming in &incoming_values {
            let expected: Ledger = serde_json::from_value(incoming.clone()).unwrap();
            let resolution =
                ImportService::resolve(&current, incoming.clone(), ImportPolicy::Replace)
                    .expect("valid import");
            assert_eq!(resolution.ledger, expected);
        }
    }
}

#[test]
fn invalid_import_is_rejected_without_touching_current() {
    let mut missing_revenue = record("a", "Janeiro", json!(5000), 2);
    missing_revenue.as_object_mut().unwrap().remove("revenue");
    let invalid = vec![
        json!(42),
        json!("ledger"),
        json!({ "records": [] }),
        json!(null),
        json!([missing_revenue]),
        json!([record("a", "Janeiro", json!(-1), 2)]),
        json!([record("a", "Janeiro", json!(5000), 2), record("a", "Maio", json!(1), 2)]),
        json!([record("a", "Brumário", json!(5000), 2)]),
    ];
    for current in sample_ledgers() {
        let snapshot = current.clone();
        for incoming in &invalid {
            for policy in [ImportPolicy::Replace, ImportPolicy::MergeById] {
                let err = ImportService::resolve(&current, incoming.clone(), policy)
                    .expect_err("import must be rejected");
                assert!(matches!(err, CoreError::ImportValidation(_)), "{incoming}");
            }
        }
        assert_eq!(current, snapshot);
    }
}

#[test]
fn saved_ledger_loads_back_equal() {
    for ledger in sample_ledgers() {
        let storage = MemoryLedgerStorage::new("flat_money_data");
        storage.save_ledger(&ledger).expect("save");
        let loaded = storage.load_ledger().expect("load");
        assert_eq!(loaded.ledger, ledger);
        assert!(loaded.warnings.is_empty());
    }
}

#[test]
fn tampered_record_is_corrupted() {
    let tampered = [
        "{}",
        "null",
        "17",
        "[1, 2, 3]",
        "[{\"id\": \"a\"}]",
        "[{\"id\": \"a\", \"month\": \"Janeiro\"",
    ];
    for contents in tampered {
        let storage = MemoryLedgerStorage::new("flat_money_data");
        storage
            .save_ledger(&sample_ledgers()[2])
            .expect("save");
        storage.tamper(contents);
        let err = storage.load_ledger().expect_err(contents);
        assert!(matches!(err, CoreError::CorruptedStorage(_)), "{contents}");
    }
}

#[test]
fn mask_round_trips_and_is_idempotent() {
    let locale = LocaleConfig::pt_br();
    let amounts = [
        0_i64,
        1,
        10,
        99,
        100,
        150_075,
        999_999,
        1_000_000,
        123_456_789,
        99_999_999_999_999,
    ];
    for cents in amounts {
        let value = Money::from_cents(cents);
        assert_eq!(parse_digits(&format(value, &locale)).unwrap(), value);
    }
    for raw in ["", "7", "150075", "abc123", "0000", "1.234,5", "R$ 12"] {
        let once = reformat_on_keystroke(raw, &locale).unwrap();
        let twice = reformat_on_keystroke(&once, &locale).unwrap();
        assert_eq!(once, twice, "input {raw:?}");
    }
}
