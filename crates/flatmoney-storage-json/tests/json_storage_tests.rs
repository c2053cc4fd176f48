use std::{fs, sync::Arc};

use flatmoney_core::{
    CoreError, FixedClock, ImportPolicy, LedgerSession, LedgerStorage,
};
use flatmoney_domain::{Ledger, Money, MonthLabel, MonthRecordDraft, RecordIdentity};
use flatmoney_storage_json::{export_ledger_to_path, read_json_file, JsonLedgerStorage};
use tempfile::tempdir;

fn ledger(months: &[MonthLabel]) -> Ledger {
    let records = months
        .iter()
        .enumerate()
        .map(|(index, month)| {
            MonthRecordDraft::new(*month, 2024)
                .with_revenue(Money::from_cents(450_000 + index as i64))
                .with_expense("Condomínio", Money::from_cents(80_000))
                .into_record(RecordIdentity::fresh(index as i64))
                .expect("valid record")
        })
        .collect();
    Ledger::try_from_records(records).expect("unique ids")
}

#[test]
fn json_storage_can_save_and_load_ledger() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonLedgerStorage::new(dir.path(), "flat_money_data").expect("create storage");
    assert!(storage.load_ledger().expect("empty load").ledger.is_empty());

    let ledger = ledger(&[MonthLabel::January, MonthLabel::February]);
    storage.save_ledger(&ledger).expect("save ledger");

    let path = storage.ledger_path();
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());
    assert_eq!(storage.load_ledger().expect("load").ledger, ledger);

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert!(raw.is_array());
}

#[test]
fn json_storage_reports_tampered_file_as_corrupted() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonLedgerStorage::new(dir.path(), "flat_money_data").expect("create storage");
    storage.save_ledger(&ledger(&[MonthLabel::May])).expect("save");

    fs::write(storage.ledger_path(), "{\"not\": \"a ledger\"}").unwrap();
    let err = storage.load_ledger().unwrap_err();
    assert!(matches!(err, CoreError::CorruptedStorage(_)));
}

#[test]
fn json_storage_keeps_rolling_backups() {
    let dir = tempdir().expect("tempdir");
    let storage =
        JsonLedgerStorage::with_retention(dir.path(), "flat_money_data", 2).expect("storage");
    for count in 1..=4 {
        let months = &MonthLabel::ALL[..count];
        storage.save_ledger(&ledger(months)).expect("save");
    }
    let backups = storage.list_backups().expect("list backups");
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().all(|info| info.created_at.is_some()));
    assert!(backups[0].created_at >= backups[1].created_at);

    let restored = storage.restore_backup(&backups[0]).expect("restore newest backup");
    assert_eq!(restored.ledger.len(), 3);
    assert_eq!(storage.load_ledger().unwrap().ledger.len(), 3);
}

#[test]
fn stuck_old_backup_does_not_block_saving() {
    let dir = tempdir().expect("tempdir");
    let storage =
        JsonLedgerStorage::with_retention(dir.path(), "flat_money_data", 1).expect("storage");
    storage.save_ledger(&ledger(&[MonthLabel::January])).expect("first save");

    // A directory cannot be removed with remove_file, so pruning it fails.
    let stuck = storage
        .backup_dir()
        .join("flat_money_data_20000101_000000000.json");
    fs::create_dir_all(&stuck).expect("create stuck entry");

    for count in 2..=3 {
        storage
            .save_ledger(&ledger(&MonthLabel::ALL[..count]))
            .expect("save despite stuck backup");
    }
    assert!(stuck.is_dir());
    assert_eq!(storage.load_ledger().unwrap().ledger.len(), 3);
    let backups = storage.list_backups().expect("list backups");
    assert_eq!(backups.len(), 2);
    assert_eq!(backups[1].path, stuck);
}

#[test]
fn clear_keeps_a_backup_of_the_wiped_record() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonLedgerStorage::new(dir.path(), "flat_money_data").expect("storage");
    storage.write_raw("garbage").expect("write");
    storage.clear().expect("clear");

    assert!(!storage.ledger_path().exists());
    let backups = storage.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "garbage");
    assert!(matches!(
        storage.restore_backup(&backups[0]),
        Err(CoreError::Storage(_))
    ));
}

#[test]
fn session_over_json_storage_survives_restart() {
    let dir = tempdir().expect("tempdir");
    let storage = Arc::new(JsonLedgerStorage::new(dir.path(), "flat_money_data").unwrap());
    let clock = FixedClock::at_millis(1_735_732_800_000);

    let mut session =
        LedgerSession::open(Box::new(Arc::clone(&storage)), Box::new(clock)).expect("open");
    let draft = MonthRecordDraft::new(MonthLabel::March, 2025)
        .with_revenue(Money::from_cents(320_000));
    let id = session
        .create_record(draft)
        .expect("create")
        .record_id
        .expect("id");

    let reopened =
        LedgerSession::open(Box::new(Arc::clone(&storage)), Box::new(clock)).expect("reopen");
    assert_eq!(reopened.record(&id).map(|r| r.revenue().cents()), Some(320_000));
}

#[test]
fn exported_file_imports_back() {
    let dir = tempdir().expect("tempdir");
    let export = dir.path().join("export.json");
    let source = ledger(&[MonthLabel::June, MonthLabel::July]);
    export_ledger_to_path(&source, &export).expect("export");

    let storage = JsonLedgerStorage::new(dir.path().join("data"), "flat_money_data").unwrap();
    let mut session = LedgerSession::open(
        Box::new(storage),
        Box::new(FixedClock::at_millis(0)),
    )
    .expect("open");
    let outcome = session
        .import(read_json_file(&export).expect("read export"), ImportPolicy::Replace)
        .expect("import");
    assert_eq!(outcome.stats.inserted, 2);
    assert!(outcome.report.persisted());
    assert_eq!(session.ledger(), &source);
}

#[test]
fn unreadable_import_file_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "[{").unwrap();
    assert!(matches!(
        read_json_file(&path),
        Err(CoreError::ImportValidation(_))
    ));
}
