//! Docket: Predicate-Driven Active Document Tracking
//!
//! Maintains a small, dynamically-updated set of "active" structured
//! documents that a downstream agenda build visits, instead of scanning an
//! entire corpus. Membership is decided by whether a document currently
//! matches at least one predicate declared in the host's command and view
//! configuration; the set is kept consistent incrementally as documents
//! are saved, with a cleanup pass for stale entries.

pub mod active_set;
pub mod config;
pub mod error;
pub mod logging;
pub mod mode;
pub mod path;
pub mod query;
pub mod sources;
pub mod tracker;
pub mod watch;
