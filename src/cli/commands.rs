use std::{path::Path, sync::Arc, time::Duration};

use serde_json::json;

use flatmoney_core::{
    parse_digits, ConfirmAction, CoreError, ImportPolicy, InsightTask, LedgerSession,
    MutationReport, OfflineInsightService, SummaryService,
};
use flatmoney_domain::{ExpenseDraft, MonthRecordDraft};
use flatmoney_storage_json::{export_ledger_to_path, read_json_file};

use crate::{
    cli::{
        args::{Command, RecordArgs, USAGE},
        context::CliContext,
        output,
    },
    errors::AppError,
    utils::build_info,
};

const INSIGHT_TIMEOUT: Duration = Duration::from_secs(10);

pub fn dispatch(context: &CliContext, command: Command) -> Result<(), AppError> {
    match command {
        Command::List { year } => list(context, year),
        Command::Show { id, json } => show(context, &id, json),
        Command::Add(args) => add(context, args),
        Command::Edit { id, args } => edit(context, &id, args),
        Command::Delete { id } => delete(context, &id),
        Command::Totals { year } => totals(context, year),
        Command::Import { path, merge } => import(context, &path, merge),
        Command::Export { path } => export(context, &path),
        Command::Insight { id } => insight(context, &id),
        Command::Backups => backups(context),
        Command::Restore { backup } => restore(context, &backup),
        Command::Reset => reset(context),
        Command::Mask { digits } => mask(context, &digits),
        Command::ConfigShow => {
            output::rows("Configuração", &context.config.entries());
            Ok(())
        }
        Command::ConfigSet { key, value } => config_set(context, &key, &value),
        Command::Version => {
            output::rows("FlatMoney", &build_info::current().rows());
            Ok(())
        }
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
    }
}

/// Opens the session, or explains the recovery options and fails when the
/// stored ledger cannot be read.
fn open(context: &CliContext) -> Result<LedgerSession, AppError> {
    match context.open_session() {
        Ok(session) => {
            for warning in session.load_warnings() {
                output::warning(warning);
            }
            Ok(session)
        }
        Err(corrupted) => {
            output::corruption_help(corrupted.error());
            Err(corrupted.into_error().into())
        }
    }
}

/// Surfaces a failed save. The process is about to exit, so an unsaved
/// change is an error here even though the session kept it in memory.
fn finish(report: MutationReport, message: impl std::fmt::Display) -> Result<(), AppError> {
    match report.write_error {
        None => {
            output::success(message);
            Ok(())
        }
        Some(err) => {
            output::warning("A alteração não pôde ser salva.");
            Err(err.into())
        }
    }
}

fn list(context: &CliContext, year: Option<i32>) -> Result<(), AppError> {
    let session = open(context)?;
    let records: Vec<_> = session
        .ledger()
        .chronological()
        .into_iter()
        .filter(|record| year.map_or(true, |year| record.year() == year))
        .collect();
    let summaries: Vec<_> = records
        .iter()
        .map(|record| SummaryService::summarize(record))
        .collect();
    output::record_table(&records, &summaries, &context.mask);
    Ok(())
}

fn show(context: &CliContext, id: &str, as_json: bool) -> Result<(), AppError> {
    let session = open(context)?;
    let record = session
        .record(id)
        .ok_or_else(|| CoreError::RecordNotFound(id.to_string()))?;
    let summary = SummaryService::summarize(record);
    if as_json {
        let document = json!({ "record": record, "summary": summary });
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        output::record_detail(record, &summary, &context.mask);
    }
    Ok(())
}

fn add(context: &CliContext, args: RecordArgs) -> Result<(), AppError> {
    let mut session = open(context)?;
    let draft = session
        .draft_for_today()
        .with_admin_fee_percent(i64::from(context.config.default_admin_fee_percent))
        .with_partners_count(i64::from(context.config.default_partners_count));
    let draft = apply_record_args(draft, args)?;
    let period = format!("{}/{}", draft.month, draft.year);
    let report = session.create_record(draft)?;
    let id = report.record_id.clone().unwrap_or_default();
    finish(report, format!("Registro de {period} criado ({id})."))
}

fn edit(context: &CliContext, id: &str, args: RecordArgs) -> Result<(), AppError> {
    let mut session = open(context)?;
    let record = session
        .record(id)
        .ok_or_else(|| CoreError::RecordNotFound(id.to_string()))?;
    let draft = apply_record_args(MonthRecordDraft::from_record(record), args)?;
    let report = session.edit_record(id, draft)?;
    finish(report, format!("Registro {id} atualizado."))
}

fn delete(context: &CliContext, id: &str) -> Result<(), AppError> {
    let mut session = open(context)?;
    match session.delete_record(id, &context.confirm())? {
        Some(report) => finish(report, format!("Registro {id} excluído.")),
        None => {
            output::info("Nada foi excluído.");
            Ok(())
        }
    }
}

fn totals(context: &CliContext, year: Option<i32>) -> Result<(), AppError> {
    let session = open(context)?;
    let (label, totals) = match year {
        Some(year) => (
            format!("Totais de {year}"),
            SummaryService::year_totals(session.ledger(), year),
        ),
        None => ("Totais gerais".to_string(), session.totals()),
    };
    output::totals(&label, &totals, &context.mask);
    Ok(())
}

fn import(context: &CliContext, path: &Path, merge: bool) -> Result<(), AppError> {
    let incoming = read_json_file(path)?;
    let mut session = open(context)?;
    let policy = if merge {
        ImportPolicy::MergeById
    } else {
        ImportPolicy::Replace
    };
    let outcome = session.import(incoming, policy)?;
    for warning in &outcome.stats.warnings {
        output::warning(warning);
    }
    let stats = &outcome.stats;
    let message = format!(
        "Importação concluída: {} novos, {} substituídos, {} removidos.",
        stats.inserted, stats.replaced, stats.removed
    );
    finish(outcome.report, message)
}

fn export(context: &CliContext, path: &Path) -> Result<(), AppError> {
    let session = open(context)?;
    export_ledger_to_path(session.ledger(), path)?;
    output::success(format!(
        "{} registro(s) exportados para {}.",
        session.ledger().len(),
        path.display()
    ));
    Ok(())
}

fn insight(context: &CliContext, id: &str) -> Result<(), AppError> {
    let session = open(context)?;
    let request = session
        .insight_request(id, &context.mask)
        .ok_or_else(|| CoreError::RecordNotFound(id.to_string()))?;
    output::section(format!("Análise de {}/{}", request.month_label, request.year));
    let task = InsightTask::spawn(Arc::new(OfflineInsightService), request);
    output::info(task.wait(INSIGHT_TIMEOUT));
    Ok(())
}

fn backups(context: &CliContext) -> Result<(), AppError> {
    output::backups(&context.storage.list_backups()?);
    Ok(())
}

fn restore(context: &CliContext, backup_id: &str) -> Result<(), AppError> {
    let backup = context
        .storage
        .list_backups()?
        .into_iter()
        .find(|info| info.id == backup_id || info.id.trim_end_matches(".json") == backup_id)
        .ok_or_else(|| AppError::Input(format!("no backup named `{backup_id}`")))?;
    let prompt = format!("Substituir o registro atual pelo backup {}?", backup.id);
    if !context.confirm().confirm(&prompt) {
        output::info("Restauração cancelada.");
        return Ok(());
    }
    let restored = context.storage.restore_backup(&backup)?;
    for warning in &restored.warnings {
        output::warning(warning);
    }
    output::success(format!(
        "Backup {} restaurado ({} registro(s)).",
        backup.id,
        restored.ledger.len()
    ));
    Ok(())
}

fn reset(context: &CliContext) -> Result<(), AppError> {
    let confirm = context.confirm();
    let cleared = match context.open_session() {
        Ok(mut session) => session.reset(&confirm)?,
        Err(corrupted) => {
            output::warning(format!("O registro salvo está corrompido: {}", corrupted.error()));
            if confirm.confirm("Descartar o registro corrompido e começar do zero?") {
                corrupted.wipe_and_restart()?;
                true
            } else {
                false
            }
        }
    };
    if cleared {
        output::success("Todos os registros foram apagados. Um backup foi mantido.");
    } else {
        output::info("Nada foi apagado.");
    }
    Ok(())
}

fn mask(context: &CliContext, digits: &str) -> Result<(), AppError> {
    println!("{}", context.mask.reformat(digits)?);
    Ok(())
}

fn config_set(context: &CliContext, key: &str, value: &str) -> Result<(), AppError> {
    let mut config = context.config.clone();
    config.set_value(key, value)?;
    context.config_manager.save(&config)?;
    tracing::info!(key, "configuration updated");
    output::success(format!("Preferência `{key}` atualizada."));
    Ok(())
}

/// Overlays command-line fields on `draft`. Expenses given on the command
/// line replace the draft's list; `--clear-expenses` empties it.
fn apply_record_args(
    mut draft: MonthRecordDraft,
    args: RecordArgs,
) -> Result<MonthRecordDraft, AppError> {
    if let Some(month) = args.month {
        draft.month = month;
    }
    if let Some(year) = args.year {
        draft.year = year;
    }
    if let Some(revenue) = args.revenue.as_deref() {
        draft.revenue = parse_digits(revenue)?;
    }
    if args.clear_expenses || !args.expenses.is_empty() {
        draft.expenses = args
            .expenses
            .iter()
            .map(|(description, digits)| {
                parse_digits(digits).map(|amount| ExpenseDraft::new(description.as_str(), amount))
            })
            .collect::<Result<_, _>>()?;
    }
    if let Some(fee) = args.admin_fee_percent {
        draft.admin_fee_percent = fee;
    }
    if let Some(partners) = args.partners_count {
        draft.partners_count = partners;
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatmoney_domain::{Money, MonthLabel};

    #[test]
    fn record_args_overlay_the_draft() {
        let draft = MonthRecordDraft::new(MonthLabel::January, 2024)
            .with_expense("Luz", Money::from_cents(100));
        let args = RecordArgs {
            month: Some(MonthLabel::March),
            revenue: Some("1.500,75".into()),
            expenses: vec![("Internet".into(), "9990".into())],
            partners_count: Some(0),
            ..RecordArgs::default()
        };
        let draft = apply_record_args(draft, args).unwrap();
        assert_eq!(draft.month, MonthLabel::March);
        assert_eq!(draft.year, 2024);
        assert_eq!(draft.revenue, Money::from_cents(150_075));
        assert_eq!(draft.expenses.len(), 1);
        assert_eq!(draft.expenses[0].description, "Internet");
        assert_eq!(draft.partners_count, 0);
    }

    #[test]
    fn untouched_expenses_are_kept() {
        let draft = MonthRecordDraft::new(MonthLabel::January, 2024)
            .with_expense("Luz", Money::from_cents(100));
        let draft = apply_record_args(draft, RecordArgs::default()).unwrap();
        assert_eq!(draft.expenses.len(), 1);
    }

    #[test]
    fn clear_expenses_empties_the_list() {
        let draft = MonthRecordDraft::new(MonthLabel::January, 2024)
            .with_expense("Luz", Money::from_cents(100));
        let args = RecordArgs {
            clear_expenses: true,
            ..RecordArgs::default()
        };
        assert!(apply_record_args(draft, args).unwrap().expenses.is_empty());
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let args = RecordArgs {
            revenue: Some("9".repeat(20)),
            ..RecordArgs::default()
        };
        let draft = MonthRecordDraft::new(MonthLabel::January, 2024);
        assert!(apply_record_args(draft, args).is_err());
    }
}
