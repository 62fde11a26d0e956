//! hh-db - Remote database layer for the HouseHelp schema applier
//!
//! This crate provides the `Database` trait and a backend that runs SQL
//! through the hosted backend's `exec_sql` remote procedure over HTTP.

pub mod error;
pub mod rest;
pub mod traits;

pub use error::{DbError, DbResult, ErrorKind};
pub use rest::{RestBackend, RestOptions};
pub use traits::Database;
