use std::{
    io::{self, IsTerminal},
    path::PathBuf,
};

use flatmoney_config::{default_base_dir, Config, ConfigManager};
use flatmoney_core::{CorruptedSession, CurrencyMask, LedgerSession, LocaleConfig, SystemClock};
use flatmoney_storage_json::JsonLedgerStorage;

use crate::{cli::io::CliConfirm, errors::AppError};

/// Everything a command needs, resolved once from configuration.
#[derive(Debug)]
pub struct CliContext {
    pub config: Config,
    pub config_manager: ConfigManager,
    pub data_dir: PathBuf,
    pub storage: JsonLedgerStorage,
    pub mask: CurrencyMask,
    pub assume_yes: bool,
    pub interactive: bool,
}

impl CliContext {
    pub fn load(assume_yes: bool) -> Result<Self, AppError> {
        let base = default_base_dir();
        let config_manager = ConfigManager::with_base_dir(&base)?;
        let config = config_manager.load()?;
        let data_dir = config.resolve_data_dir(&base);
        let storage = JsonLedgerStorage::with_retention(
            &data_dir,
            &config.storage_key,
            config.backup_retention,
        )?;
        let locale = LocaleConfig::from_tag(&config.locale).unwrap_or_default();
        let interactive = io::stdin().is_terminal() && io::stdout().is_terminal();

        if !config.ui_color_enabled || !io::stdout().is_terminal() {
            colored::control::set_override(false);
        }
        tracing::debug!(data_dir = %data_dir.display(), key = %config.storage_key, "cli context loaded");

        Ok(Self {
            config,
            config_manager,
            data_dir,
            storage,
            mask: CurrencyMask::new(locale),
            assume_yes,
            interactive,
        })
    }

    pub fn confirm(&self) -> CliConfirm {
        CliConfirm::new(self.assume_yes, self.interactive)
    }

    /// Opens a session on the configured storage. A corrupted record is
    /// handed back untouched so the caller can decide how to recover.
    pub fn open_session(&self) -> Result<LedgerSession, CorruptedSession> {
        LedgerSession::open(Box::new(self.storage.clone()), Box::new(SystemClock))
    }
}
