//! CLI handling
//!
//! - Argument parsing structures
//! - Settings resolution and the command flow
//! - Log level selection

pub mod args;
pub mod help;
pub mod router;

pub use args::Cli;
pub use help::get_log_level;
pub use router::{execute_command, Invocation, Outcome};
