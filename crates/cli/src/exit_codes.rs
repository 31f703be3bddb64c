//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success (diagnostics may still have been reported)    |
//! | 1    | General error (unspecified)                           |
//! | 2    | CLI usage error (bad args)                            |
//! | 3    | Input file missing, unreadable or unparseable         |
//! | 4    | Input is missing a required column                    |
//! | 5    | Config file unreadable or invalid                     |
//! | 6    | Report could not be written                           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `CliError`

use claimgrid_pipeline::PipelineError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// clap exits with this code on its own parse failures.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// An input export could not be opened, decoded or parsed, or a monetary
/// cell held text that is not a number.
pub const EXIT_INPUT: u8 = 3;

/// An input export lacks a column the pipeline requires.
pub const EXIT_SCHEMA: u8 = 4;

/// The pipeline config could not be read, parsed or validated.
pub const EXIT_CONFIG: u8 = 5;

/// The report workbook could not be built or saved.
pub const EXIT_OUTPUT: u8 = 6;

/// Map a pipeline error to its exit code.
pub fn pipeline_exit_code(err: &PipelineError) -> u8 {
    match err {
        PipelineError::ConfigParse(_) | PipelineError::ConfigValidation(_) => EXIT_CONFIG,
        PipelineError::MissingColumn { .. } => EXIT_SCHEMA,
        PipelineError::InvalidNumber { .. } => EXIT_INPUT,
    }
}
