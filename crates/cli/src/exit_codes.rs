//! CLI Exit Code Registry
//!
//! Single source of truth for `rlink` exit codes. Scripts depend on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args)                                |
//! | 3    | Invalid config (TOML parse or validation failure)         |
//! | 4    | Runtime error (unreadable input, CSV framing, write fail) |
//! | 5    | Invariant violation inside the linkage run                |
//! | 6    | Unresolved ambiguity under the strict tie policy          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in [`link_exit_code`]

use rosterlink_linkage::LinkError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Input missing or unreadable, CSV framing error, or output not writable.
pub const EXIT_RUNTIME: u8 = 4;

/// A payroll was consumed that the candidate index did not hold.
pub const EXIT_INVARIANT: u8 = 5;

/// Strict tie policy: candidates remained tied after every stage.
pub const EXIT_AMBIGUOUS: u8 = 6;

/// Map a LinkError to its exit code.
pub fn link_exit_code(err: &LinkError) -> u8 {
    match err {
        LinkError::ConfigParse(_) | LinkError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        LinkError::Csv { .. } | LinkError::Io(_) => EXIT_RUNTIME,
        LinkError::PayrollNotIndexed { .. } => EXIT_INVARIANT,
        LinkError::AmbiguousMatch { .. } => EXIT_AMBIGUOUS,
    }
}
