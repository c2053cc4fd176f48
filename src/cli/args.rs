//! Argument parsing for `flatmoney_cli`.

use std::path::PathBuf;

use flatmoney_domain::MonthLabel;

use crate::errors::AppError;

pub const USAGE: &str = "\
Usage: flatmoney_cli [--yes] <command> [args]

Commands:
  list [year]                      List month records in calendar order
  show <id> [--json]               Show a record with its summary
  add [month] [year] [options]     Record a month (defaults to the current month)
  edit <id> [options]              Change a month record
  delete <id>                      Delete a month record
  totals [year]                    Sum every month, or one year
  import <file> [--merge]          Replace the ledger with a JSON export
  export <file>                    Write the ledger as JSON
  insight <id>                     Short written analysis of a month
  backups                          List ledger backups
  restore <backup>                 Restore a backup listed by `backups`
  reset                            Delete every record
  mask <digits>                    Show how typed digits are displayed
  config [show]                    Show preferences
  config set <key> <value>         Change a preference
  version                          Show build metadata
  help                             Show this message

Record options:
  --month <month>   --year <year>
  --revenue <digits>               Typed digits, e.g. 500000 for 5.000,00
  --expense <description=digits>   Repeatable; on edit replaces the list
  --clear-expenses                 Remove all expenses (edit)
  --fee <percent>   --partners <count>

Use --yes to skip confirmation prompts.";

/// Field changes requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordArgs {
    pub month: Option<MonthLabel>,
    pub year: Option<i32>,
    pub revenue: Option<String>,
    pub expenses: Vec<(String, String)>,
    pub clear_expenses: bool,
    pub admin_fee_percent: Option<i64>,
    pub partners_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { year: Option<i32> },
    Show { id: String, json: bool },
    Add(RecordArgs),
    Edit { id: String, args: RecordArgs },
    Delete { id: String },
    Totals { year: Option<i32> },
    Import { path: PathBuf, merge: bool },
    Export { path: PathBuf },
    Insight { id: String },
    Backups,
    Restore { backup: String },
    Reset,
    Mask { digits: String },
    ConfigShow,
    ConfigSet { key: String, value: String },
    Version,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub assume_yes: bool,
}

/// Parses the arguments after the program name.
pub fn parse<I, S>(args: I) -> Result<Invocation, AppError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut assume_yes = false;
    let mut rest = Vec::new();
    for arg in args.into_iter().map(Into::into) {
        match arg.as_str() {
            "--yes" | "-y" => assume_yes = true,
            _ => rest.push(arg),
        }
    }

    let mut words = rest.into_iter();
    let name = words.next().unwrap_or_else(|| "help".to_string());
    let mut words: Vec<String> = words.collect();

    let command = match name.as_str() {
        "list" => Command::List {
            year: optional_year(&mut words)?,
        },
        "totals" => Command::Totals {
            year: optional_year(&mut words)?,
        },
        "show" => {
            let json = take_flag(&mut words, "--json");
            Command::Show {
                id: required(&mut words, "record id")?,
                json,
            }
        }
        "add" => {
            let mut record = record_args(&mut words)?;
            if let Some(month) = next_positional(&mut words) {
                record.month = Some(month.parse()?);
            }
            if let Some(year) = next_positional(&mut words) {
                record.year = Some(parse_year(&year)?);
            }
            Command::Add(record)
        }
        "edit" => {
            let args = record_args(&mut words)?;
            Command::Edit {
                id: required(&mut words, "record id")?,
                args,
            }
        }
        "delete" => Command::Delete {
            id: required(&mut words, "record id")?,
        },
        "import" => {
            let merge = take_flag(&mut words, "--merge");
            Command::Import {
                path: PathBuf::from(required(&mut words, "file")?),
                merge,
            }
        }
        "export" => Command::Export {
            path: PathBuf::from(required(&mut words, "file")?),
        },
        "insight" => Command::Insight {
            id: required(&mut words, "record id")?,
        },
        "backups" => Command::Backups,
        "restore" => Command::Restore {
            backup: required(&mut words, "backup")?,
        },
        "reset" => Command::Reset,
        "mask" => Command::Mask {
            digits: words.drain(..).collect::<Vec<_>>().join(" "),
        },
        "config" => match next_positional(&mut words).as_deref() {
            None | Some("show") => Command::ConfigShow,
            Some("set") => Command::ConfigSet {
                key: required(&mut words, "config key")?,
                value: words.drain(..).collect::<Vec<_>>().join(" "),
            },
            Some(other) => {
                return Err(AppError::Input(format!("unknown config action `{other}`")))
            }
        },
        "version" | "--version" | "-V" => Command::Version,
        "help" | "--help" | "-h" => Command::Help,
        other => return Err(AppError::Input(format!("unknown command `{other}`"))),
    };

    if let Some(extra) = words.first() {
        return Err(AppError::Input(format!("unexpected argument `{extra}`")));
    }

    Ok(Invocation {
        command,
        assume_yes,
    })
}

fn record_args(words: &mut Vec<String>) -> Result<RecordArgs, AppError> {
    let mut record = RecordArgs::default();
    let mut positional = Vec::new();
    let mut iter = std::mem::take(words).into_iter();
    while let Some(word) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .ok_or_else(|| AppError::Input(format!("{flag} needs a value")))
        };
        match word.as_str() {
            "--month" => record.month = Some(value("--month")?.parse()?),
            "--year" => record.year = Some(parse_year(&value("--year")?)?),
            "--revenue" => record.revenue = Some(value("--revenue")?),
            "--expense" => record.expenses.push(split_expense(&value("--expense")?)?),
            "--clear-expenses" => record.clear_expenses = true,
            "--fee" => record.admin_fee_percent = Some(parse_int(&value("--fee")?, "--fee")?),
            "--partners" => {
                record.partners_count = Some(parse_int(&value("--partners")?, "--partners")?)
            }
            flag if flag.starts_with("--") => {
                return Err(AppError::Input(format!("unknown option `{flag}`")))
            }
            _ => positional.push(word),
        }
    }
    *words = positional;
    Ok(record)
}

fn split_expense(raw: &str) -> Result<(String, String), AppError> {
    let (description, digits) = raw.rsplit_once('=').ok_or_else(|| {
        AppError::Input(format!("expense `{raw}` must look like description=digits"))
    })?;
    Ok((description.to_string(), digits.to_string()))
}

fn take_flag(words: &mut Vec<String>, flag: &str) -> bool {
    let before = words.len();
    words.retain(|word| word != flag);
    words.len() != before
}

fn next_positional(words: &mut Vec<String>) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.remove(0))
    }
}

fn required(words: &mut Vec<String>, what: &str) -> Result<String, AppError> {
    next_positional(words).ok_or_else(|| AppError::Input(format!("missing {what}")))
}

fn optional_year(words: &mut Vec<String>) -> Result<Option<i32>, AppError> {
    next_positional(words).map(|raw| parse_year(&raw)).transpose()
}

fn parse_year(raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Input(format!("`{raw}` is not a year")))
}

fn parse_int(raw: &str, flag: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Input(format!("{flag} expects a whole number, got `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_options() {
        let invocation = parse([
            "add",
            "maio",
            "2024",
            "--revenue",
            "500000",
            "--expense",
            "Luz=12050",
            "--expense",
            "Taxa=condomínio=30000",
            "--partners",
            "3",
        ])
        .unwrap();
        let Command::Add(record) = invocation.command else {
            panic!("expected add");
        };
        assert_eq!(record.month, Some(MonthLabel::May));
        assert_eq!(record.year, Some(2024));
        assert_eq!(record.revenue.as_deref(), Some("500000"));
        assert_eq!(record.expenses[1], ("Taxa=condomínio".into(), "30000".into()));
        assert_eq!(record.partners_count, Some(3));
    }

    #[test]
    fn yes_flag_is_global() {
        let invocation = parse(["delete", "--yes", "abc"]).unwrap();
        assert!(invocation.assume_yes);
        assert_eq!(invocation.command, Command::Delete { id: "abc".into() });
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(matches!(parse(["fly"]), Err(AppError::Input(_))));
        assert!(matches!(parse(["list", "soon"]), Err(AppError::Input(_))));
        assert!(matches!(parse(["show"]), Err(AppError::Input(_))));
        assert!(matches!(parse(["edit", "id", "--fee"]), Err(AppError::Input(_))));
        assert!(matches!(parse(["export", "a", "b"]), Err(AppError::Input(_))));
    }

    #[test]
    fn no_arguments_shows_help() {
        assert_eq!(parse(Vec::<String>::new()).unwrap().command, Command::Help);
    }

    #[test]
    fn config_actions() {
        assert_eq!(parse(["config"]).unwrap().command, Command::ConfigShow);
        assert_eq!(
            parse(["config", "set", "data_dir", "/srv/my", "flat"])
                .unwrap()
                .command,
            Command::ConfigSet {
                key: "data_dir".into(),
                value: "/srv/my flat".into()
            }
        );
        assert!(matches!(parse(["config", "set"]), Err(AppError::Input(_))));
        assert!(matches!(parse(["config", "wipe"]), Err(AppError::Input(_))));
    }

    #[test]
    fn import_merge_flag() {
        let invocation = parse(["import", "--merge", "ledger.json"]).unwrap();
        assert_eq!(
            invocation.command,
            Command::Import {
                path: PathBuf::from("ledger.json"),
                merge: true
            }
        );
    }
}
