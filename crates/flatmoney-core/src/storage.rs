use std::sync::{Arc, Mutex};

use flatmoney_domain::Ledger;

use crate::{
    ledger_codec::{decode_ledger_str, encode_ledger, DecodedLedger},
    CoreError,
};

/// A single durable key holding the serialized ledger.
///
/// Backends only move text; the provided `load_ledger`/`save_ledger` methods
/// own the ledger shape so every backend reports corruption the same way.
pub trait LedgerStorage: Send + Sync {
    fn key(&self) -> &str;

    /// Current contents of the key, or `None` when it was never written.
    fn read_raw(&self) -> Result<Option<String>, CoreError>;

    /// Replaces the contents of the key. Readers never observe a partial write.
    fn write_raw(&self, contents: &str) -> Result<(), CoreError>;

    /// Removes the key so the next load starts from an empty ledger.
    fn clear(&self) -> Result<(), CoreError>;

    /// Reads the ledger. A missing or blank record is an empty ledger; any
    /// other content that is not a ledger is [`CoreError::CorruptedStorage`].
    fn load_ledger(&self) -> Result<DecodedLedger, CoreError> {
        // An unreadable record gets the same recovery choices as a malformed one.
        let raw = self.read_raw().map_err(|err| match err {
            CoreError::CorruptedStorage(reason) => CoreError::CorruptedStorage(reason),
            other => CoreError::CorruptedStorage(other.to_string()),
        })?;
        match raw {
            Some(text) if !text.trim().is_empty() => decode_ledger_str(&text).map_err(|err| {
                tracing::error!(key = self.key(), error = %err, "stored ledger is corrupted");
                CoreError::CorruptedStorage(err.to_string())
            }),
            _ => Ok(DecodedLedger {
                ledger: Ledger::new(),
                warnings: Vec::new(),
            }),
        }
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<(), CoreError> {
        let contents = encode_ledger(ledger)?;
        self.write_raw(&contents).map_err(|err| match err {
            CoreError::PersistenceWrite(reason) => CoreError::PersistenceWrite(reason),
            other => CoreError::PersistenceWrite(other.to_string()),
        })
    }
}

/// In-process storage, optionally limited to a byte quota to mimic a full device.
#[derive(Debug)]
pub struct MemoryLedgerStorage {
    key: String,
    contents: Mutex<Option<String>>,
    quota: Mutex<Option<usize>>,
}

impl MemoryLedgerStorage {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            contents: Mutex::new(None),
            quota: Mutex::new(None),
        }
    }

    /// Starts with `contents` already stored under the key.
    pub fn with_contents(key: impl Into<String>, contents: impl Into<String>) -> Self {
        let storage = Self::new(key);
        if let Ok(mut slot) = storage.contents.lock() {
            *slot = Some(contents.into());
        }
        storage
    }

    /// Fails every write larger than `bytes`.
    pub fn with_quota(self, bytes: usize) -> Self {
        self.set_quota(Some(bytes));
        self
    }

    pub fn set_quota(&self, bytes: Option<usize>) {
        if let Ok(mut quota) = self.quota.lock() {
            *quota = bytes;
        }
    }

    /// Overwrites the stored text without any checks.
    pub fn tamper(&self, contents: impl Into<String>) {
        if let Ok(mut slot) = self.contents.lock() {
            *slot = Some(contents.into());
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|slot| slot.clone())
    }
}

impl LedgerStorage for MemoryLedgerStorage {
    fn key(&self) -> &str {
        &self.key
    }

    fn read_raw(&self) -> Result<Option<String>, CoreError> {
        let slot = self
            .contents
            .lock()
            .map_err(|_| CoreError::Storage("memory storage lock poisoned".into()))?;
        Ok(slot.clone())
    }

    fn write_raw(&self, contents: &str) -> Result<(), CoreError> {
        let quota = self.quota.lock().ok().and_then(|quota| *quota);
        if let Some(quota) = quota {
            if contents.len() > quota {
                return Err(CoreError::PersistenceWrite(format!(
                    "quota of {quota} bytes exceeded ({} bytes)",
                    contents.len()
                )));
            }
        }
        let mut slot = self
            .contents
            .lock()
            .map_err(|_| CoreError::Storage("memory storage lock poisoned".into()))?;
        *slot = Some(contents.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        let mut slot = self
            .contents
            .lock()
            .map_err(|_| CoreError::Storage("memory storage lock poisoned".into()))?;
        *slot = None;
        Ok(())
    }
}

/// Lets a caller keep a handle on storage it has given to a session.
impl<T: LedgerStorage + ?Sized> LedgerStorage for Arc<T> {
    fn key(&self) -> &str {
        (**self).key()
    }

    fn read_raw(&self) -> Result<Option<String>, CoreError> {
        (**self).read_raw()
    }

    fn write_raw(&self, contents: &str) -> Result<(), CoreError> {
        (**self).write_raw(contents)
    }

    fn clear(&self) -> Result<(), CoreError> {
        (**self).clear()
    }
}
