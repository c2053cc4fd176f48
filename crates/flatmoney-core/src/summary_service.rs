//! Derived financial figures for month records and the whole ledger.

use serde::Serialize;

use flatmoney_domain::{Decimal, Ledger, Money, MonthRecord};

/// Financial breakdown of a single month. Never stored; recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub total_revenue: Money,
    pub total_expenses: Money,
    pub admin_fee_amount: Money,
    pub net_profit: Money,
    /// Exact share of the net profit; rounded to the cent only for display.
    #[serde(with = "rust_decimal::serde::str")]
    pub per_partner_amount: Decimal,
}

/// Sums of month summaries over a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub months: usize,
    pub total_revenue: Money,
    pub total_expenses: Money,
    pub admin_fee_amount: Money,
    pub net_profit: Money,
}

pub struct SummaryService;

impl SummaryService {
    /// Computes the summary of `record`.
    ///
    /// The admin fee is rounded half-up to the cent once and the net profit is
    /// exact cent arithmetic on top of it. The per-partner share keeps its
    /// sub-cent digits so `share * partners` gives back the net profit.
    pub fn summarize(record: &MonthRecord) -> MonthSummary {
        let total_revenue = record.revenue();
        let total_expenses: Money = record.expenses().iter().map(|item| item.amount()).sum();
        let admin_fee_amount = total_revenue.percent_of(record.admin_fee_percent());
        let net_profit = total_revenue - total_expenses - admin_fee_amount;
        let per_partner_amount = net_profit.share(record.partners_count());
        tracing::debug!(
            record = record.id(),
            net_profit = %net_profit,
            "summarized month record"
        );
        MonthSummary {
            total_revenue,
            total_expenses,
            admin_fee_amount,
            net_profit,
            per_partner_amount,
        }
    }

    pub fn ledger_totals(ledger: &Ledger) -> LedgerTotals {
        Self::totals(ledger.records().iter())
    }

    pub fn year_totals(ledger: &Ledger, year: i32) -> LedgerTotals {
        Self::totals(ledger.records().iter().filter(|record| record.year() == year))
    }

    fn totals<'a>(records: impl Iterator<Item = &'a MonthRecord>) -> LedgerTotals {
        records.fold(LedgerTotals::default(), |mut totals, record| {
            let summary = Self::summarize(record);
            totals.months += 1;
            totals.total_revenue += summary.total_revenue;
            totals.total_expenses += summary.total_expenses;
            totals.admin_fee_amount += summary.admin_fee_amount;
            totals.net_profit += summary.net_profit;
            totals
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatmoney_domain::{MonthLabel, MonthRecordDraft, RecordIdentity};

    fn record(revenue: i64, expenses: &[i64], fee: i64, partners: i64) -> MonthRecord {
        let draft = expenses.iter().enumerate().fold(
            MonthRecordDraft::new(MonthLabel::January, 2025)
                .with_revenue(Money::from_cents(revenue))
                .with_admin_fee_percent(fee)
                .with_partners_count(partners),
            |draft, (index, cents)| {
                draft.with_expense(format!("item {index}"), Money::from_cents(*cents))
            },
        );
        draft.into_record(RecordIdentity::fresh(0)).unwrap()
    }

    #[test]
    fn reference_month_splits_evenly() {
        let summary = SummaryService::summarize(&record(500_000, &[120_000, 30_000], 35, 2));
        assert_eq!(summary.admin_fee_amount, Money::from_cents(175_000));
        assert_eq!(summary.total_expenses, Money::from_cents(150_000));
        assert_eq!(summary.net_profit, Money::from_cents(175_000));
        assert_eq!(summary.per_partner_amount, Decimal::new(87_500, 2));
    }

    #[test]
    fn negative_profit_is_split_not_clamped() {
        let summary = SummaryService::summarize(&record(100_000, &[90_000], 35, 3));
        assert_eq!(summary.admin_fee_amount, Money::from_cents(35_000));
        assert_eq!(summary.net_profit, Money::from_cents(-25_000));
        assert_eq!(Money::rounded_from(summary.per_partner_amount), Money::from_cents(-8_333));
        assert!(summary.per_partner_amount < Decimal::new(-8_333, 2));
    }

    #[test]
    fn tiny_profit_shared_by_many_partners_recombines() {
        let summary = SummaryService::summarize(&record(3, &[], 0, 7));
        assert_eq!(summary.net_profit, Money::from_cents(3));
        let recombined = summary.per_partner_amount * Decimal::from(7);
        assert!((recombined - summary.net_profit.to_decimal()).abs() <= Decimal::new(1, 2));
    }

    #[test]
    fn empty_month_is_all_zero() {
        let summary = SummaryService::summarize(&record(0, &[], 35, 2));
        assert!(summary.net_profit.is_zero());
        assert!(summary.per_partner_amount.is_zero());
    }

    #[test]
    fn net_profit_matches_definition_across_inputs() {
        let revenues = [0, 1, 99, 12_345, 500_000, 1_000_001, 99_999_999_999];
        let fees = [0, 1, 33, 35, 50, 99, 100];
        let partners = [1, 2, 3, 7, 13, 97, 1_000, 65_535];
        for revenue in revenues {
            for fee in fees {
                for p in partners {
                    let expenses = [revenue / 3, 17];
                    let summary = SummaryService::summarize(&record(revenue, &expenses, fee, p));
                    let fee_cents = (revenue as i128 * fee as i128 + 50) / 100;
                    let expected = revenue - expenses.iter().sum::<i64>() - fee_cents as i64;
                    assert_eq!(summary.net_profit.cents(), expected);
                    let recombined = summary.per_partner_amount * Decimal::from(p);
                    let drift = (recombined - summary.net_profit.to_decimal()).abs();
                    assert!(
                        drift <= Decimal::new(1, 2),
                        "split drift for revenue={revenue} fee={fee} partners={p}"
                    );
                }
            }
        }
    }

    #[test]
    fn ledger_and_year_totals_sum_months() {
        let mut ledger = Ledger::new();
        ledger.upsert(record(500_000, &[120_000, 30_000], 35, 2));
        ledger.upsert(record(100_000, &[90_000], 35, 3));
        let totals = SummaryService::ledger_totals(&ledger);
        assert_eq!(totals.months, 2);
        assert_eq!(totals.total_revenue, Money::from_cents(600_000));
        assert_eq!(totals.net_profit, Money::from_cents(150_000));
        assert_eq!(SummaryService::year_totals(&ledger, 2024).months, 0);
        assert_eq!(SummaryService::year_totals(&ledger, 2025).months, 2);
    }
}
