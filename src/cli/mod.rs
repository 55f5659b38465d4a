//! Command-line surface

pub mod commands;
pub mod logging;

pub use commands::{run_analyze, run_export, ExportArgs, ExportFormat};
pub use logging::init_logging;
