use std::{
    env, fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable that relocates every FlatMoney file.
pub const HOME_ENV: &str = "FLATMONEY_HOME";

const SUPPORTED_LOCALES: [&str; 2] = ["pt-BR", "en-US"];

/// Stores user preferences. Every field falls back to its default when missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_locale")]
    pub locale: String,
    /// Name of the single durable record holding the ledger.
    #[serde(default = "Config::default_storage_key")]
    pub storage_key: String,
    #[serde(default = "Config::default_admin_fee_percent")]
    pub default_admin_fee_percent: u8,
    #[serde(default = "Config::default_partners_count")]
    pub default_partners_count: u32,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom data directory. Defaults to the base directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Self::default_locale(),
            storage_key: Self::default_storage_key(),
            default_admin_fee_percent: Self::default_admin_fee_percent(),
            default_partners_count: Self::default_partners_count(),
            backup_retention: Self::default_backup_retention(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_locale() -> String {
        "pt-BR".into()
    }

    pub fn default_storage_key() -> String {
        "flat_money_data".into()
    }

    pub fn default_admin_fee_percent() -> u8 {
        35
    }

    pub fn default_partners_count() -> u32 {
        2
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_LOCALES
            .iter()
            .any(|locale| locale.eq_ignore_ascii_case(&self.locale.replace('_', "-")))
        {
            return Err(ConfigError::Invalid {
                field: "locale",
                reason: format!(
                    "`{}` is not one of {}",
                    self.locale,
                    SUPPORTED_LOCALES.join(", ")
                ),
            });
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage_key",
                reason: "must not be empty".into(),
            });
        }
        if self.default_admin_fee_percent > 100 {
            return Err(ConfigError::Invalid {
                field: "default_admin_fee_percent",
                reason: format!("{} is above 100", self.default_admin_fee_percent),
            });
        }
        if self.default_partners_count == 0 {
            return Err(ConfigError::Invalid {
                field: "default_partners_count",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Current values as `(key, value)` pairs, in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("locale", self.locale.clone()),
            ("storage_key", self.storage_key.clone()),
            (
                "default_admin_fee_percent",
                self.default_admin_fee_percent.to_string(),
            ),
            (
                "default_partners_count",
                self.default_partners_count.to_string(),
            ),
            ("backup_retention", self.backup_retention.to_string()),
            ("ui_color_enabled", self.ui_color_enabled.to_string()),
            (
                "data_dir",
                self.data_dir
                    .as_ref()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_else(|| "(default)".into()),
            ),
        ]
    }

    /// Parses `value` into the field named `key` and validates the result.
    ///
    /// On error the config is left unchanged. An empty `data_dir` clears it.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let mut updated = self.clone();
        match key.trim().to_ascii_lowercase().as_str() {
            "locale" => updated.locale = value.to_string(),
            "storage_key" => updated.storage_key = value.to_string(),
            "default_admin_fee_percent" => {
                updated.default_admin_fee_percent = parse_field("default_admin_fee_percent", value)?
            }
            "default_partners_count" => {
                updated.default_partners_count = parse_field("default_partners_count", value)?
            }
            "backup_retention" => {
                updated.backup_retention = parse_field("backup_retention", value)?
            }
            "ui_color_enabled" => {
                updated.ui_color_enabled = parse_field("ui_color_enabled", value)?
            }
            "data_dir" => {
                updated.data_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Directory holding the ledger record and its backups.
    ///
    /// `FLATMONEY_HOME` wins over `data_dir`, which wins over `base`.
    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        if let Some(home) = env_home() {
            return home;
        }
        self.data_dir
            .clone()
            .unwrap_or_else(|| base.to_path_buf())
    }
}

/// Base directory for configuration: `FLATMONEY_HOME`, else `~/.flatmoney`.
pub fn default_base_dir() -> PathBuf {
    env_home().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".flatmoney")
    })
}

fn parse_field<T>(field: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|err: T::Err| ConfigError::Invalid {
        field,
        reason: format!("`{value}`: {err}"),
    })
}

fn env_home() -> Option<PathBuf> {
    env::var_os(HOME_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"locale": "en-US"}"#).unwrap();
        assert_eq!(cfg.locale, "en-US");
        assert_eq!(cfg.storage_key, "flat_money_data");
        assert_eq!(cfg.default_admin_fee_percent, 35);
        assert_eq!(cfg.default_partners_count, 2);
        assert_eq!(cfg.backup_retention, 5);
        assert!(cfg.data_dir.is_none());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(Config::default().validate().is_ok());

        let cfg = Config {
            locale: "fr-FR".into(),
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "locale", .. })
        ));

        let cfg = Config {
            default_partners_count: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn set_value_parses_and_validates() {
        let mut cfg = Config::default();
        cfg.set_value("default_partners_count", "3").unwrap();
        cfg.set_value("UI_COLOR_ENABLED", "false").unwrap();
        cfg.set_value("data_dir", "/srv/flat").unwrap();
        assert_eq!(cfg.default_partners_count, 3);
        assert!(!cfg.ui_color_enabled);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/srv/flat")));

        cfg.set_value("data_dir", "").unwrap();
        assert!(cfg.data_dir.is_none());
    }

    #[test]
    fn rejected_value_leaves_config_unchanged() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("default_admin_fee_percent", "140"),
            Err(ConfigError::Invalid { field: "default_admin_fee_percent", .. })
        ));
        assert!(matches!(
            cfg.set_value("default_partners_count", "many"),
            Err(ConfigError::Invalid { field: "default_partners_count", .. })
        ));
        assert!(matches!(
            cfg.set_value("theme", "dark"),
            Err(ConfigError::UnknownKey(key)) if key == "theme"
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn entries_list_every_key() {
        let keys: Vec<&str> = Config::default().entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys.len(), 7);
        assert!(keys.contains(&"backup_retention"));
    }
}
