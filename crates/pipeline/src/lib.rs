//! `claimgrid-pipeline` — claim export cleaning and reporting pipeline.
//!
//! Pure engine crate: receives pre-loaded tables, returns transformed tables
//! plus diagnostics. No CLI or file IO dependencies.

pub mod aggregate;
pub mod config;
pub mod dedup;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod schema;
pub mod table;
pub mod template;
pub mod totals;

pub use config::PipelineConfig;
pub use diagnostics::Diagnostic;
pub use engine::{run, PipelineInput, PipelineOutput};
pub use error::PipelineError;
pub use table::{Cell, Table};
pub use totals::ClaimTotals;
