//! core
//!
//! Core domain types, schemas, and parsers for Proposer.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, RemoteName, Oid, TempBranch
//! - [`commit`] - Commit records and the `git show` parser
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Parsing degrades gracefully where git output can vary

pub mod commit;
pub mod config;
pub mod types;
