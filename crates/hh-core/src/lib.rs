//! hh-core - Core library for the HouseHelp schema applier
//!
//! This crate provides the settings file, credential resolution, and the
//! schema document model (naive `;` statement splitting) shared by the
//! database, applier, and CLI crates.

pub mod config;
pub mod error;
pub mod statement;

pub use config::{ApplyMode, Credentials, KeySource, Settings};
pub use error::{CoreError, CoreResult};
pub use statement::{split_statements, SchemaDocument, Statement};
