//! flatmoney-domain
//!
//! Pure domain models (Money, MonthRecord, ExpenseItem, Ledger).
//! No I/O, no CLI, no storage. Only data types, validation rules and core enums.

pub mod common;
pub mod ledger;
pub mod money;
pub mod month;
pub mod record;

pub use common::*;
pub use ledger::*;
pub use money::*;
pub use month::*;
pub use record::*;

pub use rust_decimal::Decimal;
