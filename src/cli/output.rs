use std::fmt;

use colored::Colorize;

use flatmoney_core::{CurrencyFormatter, CurrencyMask, LedgerTotals, MonthSummary};
use flatmoney_domain::MonthRecord;
use flatmoney_storage_json::LedgerBackupInfo;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Section,
}

fn apply_style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Info => text,
        MessageKind::Success => format!("[ok] {text}").bright_green().to_string(),
        MessageKind::Warning => format!("[!] {text}").bright_yellow().to_string(),
        MessageKind::Error => format!("[x] {text}").bright_red().to_string(),
        MessageKind::Section => format!("=== {} ===", text.trim()).bold().to_string(),
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message);
    match kind {
        MessageKind::Error | MessageKind::Warning => eprintln!("{formatted}"),
        _ => println!("{formatted}"),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Colours a signed amount: losses red, everything else green.
fn signed(text: String, negative: bool) -> String {
    if negative {
        text.red().to_string()
    } else {
        text.green().to_string()
    }
}

/// One line per record in calendar order.
pub fn record_table(records: &[&MonthRecord], summaries: &[MonthSummary], mask: &CurrencyMask) {
    if records.is_empty() {
        info("Nenhum registro encontrado.");
        return;
    }
    println!(
        "{:<36}  {:<14}  {:>18}  {:>18}  {:>18}",
        "ID", "Mês", "Receita", "Despesas", "Lucro líquido"
    );
    for (record, summary) in records.iter().zip(summaries) {
        let period = record.display_label();
        let net = format!("{:>18}", mask.format_amount(summary.net_profit));
        println!(
            "{:<36}  {:<14}  {:>18}  {:>18}  {}",
            record.id(),
            period,
            mask.format_amount(summary.total_revenue),
            mask.format_amount(summary.total_expenses),
            signed(net, summary.net_profit.is_negative())
        );
    }
}

pub fn record_detail(record: &MonthRecord, summary: &MonthSummary, mask: &CurrencyMask) {
    section(record.display_label());
    info(format!("ID: {}", record.id()));
    info(format!(
        "Receita: {}",
        mask.format_amount(record.revenue())
    ));
    if record.expenses().is_empty() {
        info("Despesas: nenhuma");
    } else {
        info("Despesas:");
        for item in record.expenses() {
            info(format!(
                "  - {}: {}",
                item.description(),
                mask.format_amount(item.amount())
            ));
        }
    }
    summary_lines(
        summary,
        record.admin_fee_percent(),
        record.partners_count(),
        mask,
    );
}

fn summary_lines(summary: &MonthSummary, fee_percent: u8, partners: u32, mask: &CurrencyMask) {
    info(format!(
        "Total de despesas: {}",
        mask.format_amount(summary.total_expenses)
    ));
    info(format!(
        "Taxa de administração ({fee_percent}%): {}",
        mask.format_amount(summary.admin_fee_amount)
    ));
    info(format!(
        "Lucro líquido: {}",
        signed(
            mask.format_amount(summary.net_profit),
            summary.net_profit.is_negative()
        )
    ));
    info(format!(
        "Por sócio ({partners}): {}",
        signed(
            mask.format_share(summary.per_partner_amount),
            summary.net_profit.is_negative()
        )
    ));
}

pub fn totals(label: &str, totals: &LedgerTotals, mask: &CurrencyMask) {
    section(label);
    info(format!("Meses: {}", totals.months));
    info(format!(
        "Receita: {}",
        mask.format_amount(totals.total_revenue)
    ));
    info(format!(
        "Despesas: {}",
        mask.format_amount(totals.total_expenses)
    ));
    info(format!(
        "Taxas de administração: {}",
        mask.format_amount(totals.admin_fee_amount)
    ));
    info(format!(
        "Lucro líquido: {}",
        signed(
            mask.format_amount(totals.net_profit),
            totals.net_profit.is_negative()
        )
    ));
}

pub fn backups(entries: &[LedgerBackupInfo]) {
    if entries.is_empty() {
        info("No backups found.");
        return;
    }
    section("Backups");
    for entry in entries {
        let created = entry
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
            .unwrap_or_else(|| "unknown time".into());
        info(format!("{}  {}  {} bytes", entry.id, created, entry.size_bytes));
    }
}

pub fn rows(title: &str, rows: &[(&str, String)]) {
    section(title);
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in rows {
        info(format!("{label:<width$}  {value}"));
    }
}

/// Explains how to get out of a corrupted ledger without losing the file.
pub fn corruption_help(details: impl fmt::Display) {
    error(format!("The stored ledger is corrupted: {details}"));
    info("The file was left untouched. To recover:");
    info("  flatmoney_cli backups                  list earlier copies");
    info("  flatmoney_cli restore <backup>         restore one of them");
    info("  flatmoney_cli reset --yes              start over with an empty ledger");
}
