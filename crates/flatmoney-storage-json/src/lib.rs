use std::{
    cmp::Reverse,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use flatmoney_core::{decode_ledger_str, encode_ledger, CoreError, DecodedLedger, LedgerStorage};
use flatmoney_domain::Ledger;

const FILE_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// A rolling copy of the durable record taken before it was overwritten or cleared.
#[derive(Debug, Clone)]
pub struct LedgerBackupInfo {
    pub key: String,
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Filesystem-backed storage for one ledger key.
///
/// The record lives at `<data_dir>/<key>.json`; copies of previous contents
/// are kept under `<data_dir>/backups/<key>/`.
#[derive(Debug, Clone)]
pub struct JsonLedgerStorage {
    key: String,
    data_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonLedgerStorage {
    pub fn new(data_dir: impl Into<PathBuf>, key: &str) -> Result<Self, CoreError> {
        Self::with_retention(data_dir, key, DEFAULT_RETENTION)
    }

    pub fn with_retention(
        data_dir: impl Into<PathBuf>,
        key: &str,
        retention: usize,
    ) -> Result<Self, CoreError> {
        let data_dir = data_dir.into();
        let backups_dir = data_dir.join("backups");
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            key: canonical_name(key),
            data_dir,
            backups_dir,
            retention: retention.max(1),
        })
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", self.key, FILE_EXTENSION))
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.backups_dir.join(&self.key)
    }

    /// Backups of this key, newest first.
    pub fn list_backups(&self) -> Result<Vec<LedgerBackupInfo>, CoreError> {
        let dir = self.backup_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                let size_bytes = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
                entries.push(LedgerBackupInfo {
                    key: self.key.clone(),
                    id: file_name.to_string(),
                    created_at: parse_backup_timestamp(file_name),
                    size_bytes,
                    path: path.clone(),
                });
            }
        }
        entries.sort_by_key(|info| Reverse(info.created_at));
        Ok(entries)
    }

    /// Makes `backup` the current record after checking it holds a valid ledger.
    ///
    /// The record being replaced is itself backed up first.
    pub fn restore_backup(&self, backup: &LedgerBackupInfo) -> Result<DecodedLedger, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let contents = fs::read_to_string(&backup.path)?;
        let decoded = decode_ledger_str(&contents)
            .map_err(|err| CoreError::Storage(format!("backup `{}` is unusable: {err}", backup.id)))?;
        self.write_raw(&contents)?;
        tracing::info!(key = %self.key, backup = %backup.id, "ledger restored from backup");
        Ok(decoded)
    }

    fn backup_existing_file(&self, path: &Path) -> Result<(), CoreError> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir();
        fs::create_dir_all(&dir)?;
        let backup_path = self.next_backup_path(&dir)?;
        fs::copy(path, &backup_path)?;
        tracing::debug!(key = %self.key, backup = %backup_path.display(), "backed up ledger file");
        self.prune_backups()
    }

    // Names must sort in write order even when several writes share a millisecond.
    fn next_backup_path(&self, dir: &Path) -> Result<PathBuf, CoreError> {
        let now = Utc::now();
        let mut stamp = Utc
            .timestamp_millis_opt(now.timestamp_millis())
            .single()
            .unwrap_or(now);
        if let Some(latest) = self.list_backups()?.first().and_then(|info| info.created_at) {
            if latest >= stamp {
                stamp = latest + Duration::milliseconds(1);
            }
        }
        let file_name = format!(
            "{}_{}.{}",
            self.key,
            stamp.format(BACKUP_TIMESTAMP_FORMAT),
            FILE_EXTENSION
        );
        Ok(dir.join(file_name))
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        let entries = self.list_backups()?;
        for entry in entries.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                tracing::warn!(
                    key = %self.key,
                    backup = %entry.path.display(),
                    error = %err,
                    "could not remove old ledger backup"
                );
            }
        }
        Ok(())
    }
}

impl LedgerStorage for JsonLedgerStorage {
    fn key(&self) -> &str {
        &self.key
    }

    fn read_raw(&self) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(self.ledger_path()) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_raw(&self, contents: &str) -> Result<(), CoreError> {
        let path = self.ledger_path();
        self.backup_existing_file(&path)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Removes the record, keeping its last contents as a backup.
    fn clear(&self) -> Result<(), CoreError> {
        let path = self.ledger_path();
        if path.exists() {
            self.backup_existing_file(&path)?;
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Writes `ledger` to an arbitrary path as the same JSON array the store keeps.
pub fn export_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<(), CoreError> {
    let tmp = tmp_path(path);
    write_atomic(&tmp, &encode_ledger(ledger)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads a JSON document for import. Only syntax is checked here; shape is
/// left to the import resolver.
pub fn read_json_file(path: &Path) -> Result<Value, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| {
        CoreError::ImportValidation(format!("{} is not valid JSON: {err}", path.display()))
    })
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", FILE_EXTENSION))?;
    let mut segments = trimmed.rsplit('_');
    let time = segments.next()?;
    let date = segments.next()?;
    if !is_digits(date, 8) || !is_digits(time, 9) {
        return None;
    }
    let raw = format!("{}{}", date, time);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S%3f")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}
