//! clusterlens library
//!
//! One-shot Kubernetes cluster health analysis: fact gathering,
//! recommendation rules, and export rendering. The binary wires these
//! together; everything here is usable (and tested) without a cluster.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod export;
pub mod facts;
pub mod kube;
pub mod report;

// Re-export the types callers touch most
pub use analyzer::{analyze, AnalysisReport, Recommendation, Severity};
pub use export::ExportBundle;
pub use facts::{FactBundle, FactGatherer};
pub use report::render_table;
