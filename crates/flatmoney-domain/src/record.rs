//! Month records, expense items and the submit-time rules that build them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    common::new_entity_id,
    money::{Money, MAX_CENTS},
    month::MonthLabel,
};

pub const DEFAULT_ADMIN_FEE_PERCENT: u8 = 35;
pub const DEFAULT_PARTNERS_COUNT: u32 = 2;
pub const MAX_ADMIN_FEE_PERCENT: u8 = 100;

/// A single outgoing cost recorded against a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseItem {
    id: String,
    description: String,
    amount: Money,
}

impl ExpenseItem {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Money {
        self.amount
    }
}

/// One month of revenue, expenses and split parameters for the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    id: String,
    month: MonthLabel,
    year: i32,
    revenue: Money,
    expenses: Vec<ExpenseItem>,
    admin_fee_percent: u8,
    partners_count: u32,
    created_at: i64,
}

impl MonthRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Period shown to users, e.g. `Maio/2024`.
    pub fn display_label(&self) -> String {
        format!("{}/{}", self.month, self.year)
    }

    pub fn month(&self) -> MonthLabel {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn revenue(&self) -> Money {
        self.revenue
    }

    pub fn expenses(&self) -> &[ExpenseItem] {
        &self.expenses
    }

    pub fn admin_fee_percent(&self) -> u8 {
        self.admin_fee_percent
    }

    /// Always at least one for records built through [`MonthRecordDraft`] or normalised on load.
    pub fn partners_count(&self) -> u32 {
        self.partners_count
    }

    /// Creation time in epoch milliseconds.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn identity(&self) -> RecordIdentity {
        RecordIdentity {
            id: self.id.clone(),
            created_at: self.created_at,
        }
    }

    /// Key for default ordering: calendar position, then creation time.
    pub fn period_key(&self) -> (i32, u32, i64) {
        (self.year, self.month.number(), self.created_at)
    }

    /// Checks the rules a persisted or imported record must satisfy.
    pub fn validate_stored(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        check_amount(self.revenue, ValidationError::NegativeRevenue)?;
        for (index, item) in self.expenses.iter().enumerate() {
            if item.id.trim().is_empty() {
                return Err(ValidationError::EmptyExpenseId { index });
            }
            check_amount(item.amount, ValidationError::NegativeAmount { index })?;
        }
        Ok(())
    }

    /// Coerces split parameters into range, returning a note for every change made.
    pub fn normalize(&mut self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.partners_count < 1 {
            notes.push(format!(
                "record {} had partnersCount {}; using 1",
                self.id, self.partners_count
            ));
            self.partners_count = 1;
        }
        if self.admin_fee_percent > MAX_ADMIN_FEE_PERCENT {
            notes.push(format!(
                "record {} had adminFeePercent {}; using {}",
                self.id, self.admin_fee_percent, MAX_ADMIN_FEE_PERCENT
            ));
            self.admin_fee_percent = MAX_ADMIN_FEE_PERCENT;
        }
        notes
    }
}

/// Immutable identity carried across edits of the same record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIdentity {
    pub id: String,
    pub created_at: i64,
}

impl RecordIdentity {
    /// A new identity for a record created at `created_at` (epoch milliseconds).
    pub fn fresh(created_at: i64) -> Self {
        Self {
            id: new_entity_id(),
            created_at,
        }
    }
}

/// Raw expense row as entered in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub id: Option<String>,
    pub description: String,
    pub amount: Money,
}

impl ExpenseDraft {
    pub fn new(description: impl Into<String>, amount: Money) -> Self {
        Self {
            id: None,
            description: description.into(),
            amount,
        }
    }
}

/// Raw field values of the month form, before the entity rules are applied.
///
/// Split parameters are kept as wide signed integers so out-of-range input can
/// be coerced rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRecordDraft {
    pub month: MonthLabel,
    pub year: i32,
    pub revenue: Money,
    pub expenses: Vec<ExpenseDraft>,
    pub admin_fee_percent: i64,
    pub partners_count: i64,
}

impl MonthRecordDraft {
    pub fn new(month: MonthLabel, year: i32) -> Self {
        Self {
            month,
            year,
            revenue: Money::ZERO,
            expenses: Vec::new(),
            admin_fee_percent: DEFAULT_ADMIN_FEE_PERCENT as i64,
            partners_count: DEFAULT_PARTNERS_COUNT as i64,
        }
    }

    /// Prefills a draft from an existing record for editing.
    pub fn from_record(record: &MonthRecord) -> Self {
        Self {
            month: record.month,
            year: record.year,
            revenue: record.revenue,
            expenses: record
                .expenses
                .iter()
                .map(|item| ExpenseDraft {
                    id: Some(item.id.clone()),
                    description: item.description.clone(),
                    amount: item.amount,
                })
                .collect(),
            admin_fee_percent: record.admin_fee_percent as i64,
            partners_count: record.partners_count as i64,
        }
    }

    pub fn with_revenue(mut self, revenue: Money) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn with_expense(mut self, description: impl Into<String>, amount: Money) -> Self {
        self.expenses.push(ExpenseDraft::new(description, amount));
        self
    }

    pub fn with_admin_fee_percent(mut self, percent: i64) -> Self {
        self.admin_fee_percent = percent;
        self
    }

    pub fn with_partners_count(mut self, partners: i64) -> Self {
        self.partners_count = partners;
        self
    }

    /// Rejects drafts that cannot become a record; coercible fields are not errors.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_amount(self.revenue, ValidationError::NegativeRevenue)?;
        for (index, expense) in self.expenses.iter().enumerate() {
            if expense.description.trim().is_empty() {
                return Err(ValidationError::EmptyDescription { index });
            }
            check_amount(expense.amount, ValidationError::NegativeAmount { index })?;
        }
        Ok(())
    }

    /// Builds the record under `identity`, clamping the fee and flooring the partner count.
    pub fn into_record(self, identity: RecordIdentity) -> Result<MonthRecord, ValidationError> {
        self.validate()?;
        let expenses = self
            .expenses
            .into_iter()
            .map(|expense| ExpenseItem {
                id: expense
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(new_entity_id),
                description: expense.description.trim().to_string(),
                amount: expense.amount,
            })
            .collect();
        Ok(MonthRecord {
            id: identity.id,
            month: self.month,
            year: self.year,
            revenue: self.revenue,
            expenses,
            admin_fee_percent: self
                .admin_fee_percent
                .clamp(0, MAX_ADMIN_FEE_PERCENT as i64) as u8,
            partners_count: self.partners_count.clamp(1, u32::MAX as i64) as u32,
            created_at: identity.created_at,
        })
    }
}

fn check_amount(amount: Money, negative: ValidationError) -> Result<(), ValidationError> {
    if amount.is_negative() {
        return Err(negative);
    }
    if amount.cents() > MAX_CENTS {
        return Err(ValidationError::AmountOutOfRange);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Reasons a month record cannot be built or accepted.
pub enum ValidationError {
    EmptyId,
    EmptyExpenseId { index: usize },
    EmptyDescription { index: usize },
    NegativeAmount { index: usize },
    NegativeRevenue,
    AmountOutOfRange,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyId => f.write_str("record id must not be empty"),
            ValidationError::EmptyExpenseId { index } => {
                write!(f, "expense #{} has an empty id", index + 1)
            }
            ValidationError::EmptyDescription { index } => {
                write!(f, "expense #{} needs a description", index + 1)
            }
            ValidationError::NegativeAmount { index } => {
                write!(f, "expense #{} has a negative amount", index + 1)
            }
            ValidationError::NegativeRevenue => f.write_str("revenue must not be negative"),
            ValidationError::AmountOutOfRange => {
                f.write_str("amount is too large to be represented exactly")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
