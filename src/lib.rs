//! # wdl-omics-run
//!
//! Bundles a WDL workflow and its imports into a deterministic zip archive,
//! registers it with AWS HealthOmics (reusing an existing registration when
//! the bundle is unchanged), validates `key=value` inputs against the
//! workflow's declarations, and starts a run.
//!
//! ## Usage
//!
//! ```bash
//! wdl-omics-run --role-arn ARN --output-uri s3://bucket/out/ main.wdl key=value ...
//! ```
//!
//! ## Modules
//!
//! - `bundle` - Import graph traversal and canonical zip packaging
//! - `cli` - Argument parsing and the command flow
//! - `config` - Configuration file and environment defaults
//! - `fingerprint` - Content digests and derived workflow names
//! - `inputs` - Input parsing, coercion and validation
//! - `registry` - Reuse-or-register policy for workflows
//! - `run` - Run request assembly and submission
//! - `service` - HealthOmics access behind testable traits
//! - `wdl` - Owned view of parsed WDL documents
pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod inputs;
pub mod registry;
pub mod run;
pub mod service;
pub mod wdl;

pub use error::{Error, Result};
