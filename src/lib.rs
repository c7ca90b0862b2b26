//! scan-namer library
//!
//! Watches a scan folder, groups scanner-default files into documents, asks a
//! vision model for a title and renames the pages after it. A persistent
//! ledger keeps reruns from touching files twice.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod describe;
pub mod error;
pub mod naming;
pub mod observability;
pub mod orchestrator;
pub mod scan;
pub mod storage;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
