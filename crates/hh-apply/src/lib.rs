//! hh-apply - Schema application for HouseHelp
//!
//! Runs the statements of a schema document one at a time against a
//! [`hh_db::Database`], classifying each failure instead of aborting.

pub mod applier;

pub use applier::{
    ApplyObserver, ApplyOptions, ApplySummary, NoopObserver, SchemaApplier, StatementOutcome,
    StatementResult,
};
