//! Incremental change tracking for analysis databases.
//!
//! The host reports every mutation of its database; the tracker remembers
//! *which* entities changed, and at save time checks each one against the
//! live database to decide whether it was updated or deleted. The outcome is
//! exported into a JSONL cache next to the database file, ready to be
//! committed to version control.
//!
//! # Architecture
//!
//! - [`hooks`] - The tracker: notification intake, dirty set, reconciliation
//! - [`database`] - Read-only query capability over the host database
//! - [`storage`] - SQLite annotation log
//! - [`sync`] - Export visitor and the JSONL cache pipeline
//! - [`model`] - Identifier newtypes and notifications
//! - [`config`] - Configuration management
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod hooks;
pub mod model;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
pub use hooks::Hooks;
