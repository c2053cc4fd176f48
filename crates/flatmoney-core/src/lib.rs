//! flatmoney-core
//!
//! Business logic and services for FlatMoney: the currency mask codec, the
//! summary engine, ledger decoding, import resolution and the session facade
//! that keeps the in-memory ledger and durable storage in step.
//! Depends on flatmoney-domain. No terminal I/O, no filesystem access.

pub mod confirm;
pub mod error;
pub mod format;
pub mod import_service;
pub mod insight;
pub mod ledger_codec;
pub mod ledger_service;
pub mod session;
pub mod storage;
pub mod summary_service;
pub mod time;

pub use confirm::*;
pub use error::CoreError;
pub use format::*;
pub use import_service::*;
pub use insight::*;
pub use ledger_codec::*;
pub use ledger_service::*;
pub use session::*;
pub use storage::*;
pub use summary_service::*;
pub use time::*;
