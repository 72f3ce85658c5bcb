//! Proposer - keeps a proposal branch in step with an automation run
//!
//! Given a working checkout that may hold uncommitted edits and ad-hoc
//! commits, Proposer produces (or refreshes) a branch that cleanly
//! represents those changes relative to a base branch, ready to be pushed
//! and opened as a review request. It is built to be run repeatedly: the
//! base and the remote proposal branch may have advanced, been
//! force-pushed, or been squash-merged between runs.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Graph comparator, branch reconciler, commit harvester
//! - [`publish`] - Pushing a reconciled branch under an explicit retry policy
//! - [`core`] - Domain types, commit records, configuration
//! - [`git`] - Single interface for all Git operations
//! - [`telemetry`] - Logging setup
//!
//! # Correctness Invariants
//!
//! 1. The engine touches the repository only through [`git::CommandSurface`]
//! 2. Every scratch branch and stash entry is released on every exit path
//! 3. Position in history is decided by commit counts, never by contents

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod publish;
pub mod telemetry;
