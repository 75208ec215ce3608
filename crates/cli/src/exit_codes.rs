//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `fflow` exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, unknown view) |
//! | 3-4     | input            | Unreadable or malformed input files      |
//! | 60-69   | flow             | Config and graph validation verdicts     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `flow_exit_code` or the relevant command

use fundflow_graph::FlowError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown view id.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-4)
// =============================================================================

/// A data, config, CSV or output file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// The record store or a CSV source is malformed.
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Flow (60-69)
// =============================================================================

/// Config failed to parse or validate.
pub const EXIT_FLOW_INVALID_CONFIG: u8 = 60;

/// Assembled graph has duplicate ids, dangling references or invalid links.
pub const EXIT_FLOW_INVALID_GRAPH: u8 = 61;

/// A hub's inflow and outflow differ by more than the tolerance.
pub const EXIT_FLOW_IMBALANCE: u8 = 62;

/// Map an engine error to its exit code.
pub fn flow_exit_code(err: &FlowError) -> u8 {
    match err {
        FlowError::ConfigParse(_) | FlowError::ConfigValidation(_) => EXIT_FLOW_INVALID_CONFIG,
        FlowError::UnknownView(_) => EXIT_USAGE,
        FlowError::StoreParse(_) | FlowError::NotAnObject { .. } | FlowError::Csv { .. } => EXIT_PARSE,
        FlowError::Io(_) => EXIT_IO,
    }
}
