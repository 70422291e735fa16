//! Business-logic engines built over the db layer.
//!
//! Every entry point takes the database, an explicit [`Actor`], and typed
//! input, and wraps its reads and writes in one transaction. Engines return
//! [`EngineError`] values for expected rule violations; hosts map those to
//! transport responses.
//!
//! [`Actor`]: crate::types::Actor
//! [`EngineError`]: crate::error::EngineError

pub mod completion;
pub mod inventory;
pub mod ledger;
pub mod reports;
pub mod tasks;
