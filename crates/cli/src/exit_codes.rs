//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `medir` exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | Usage error (bad args, unknown sheet)                     |
//! | 3    | Input file could not be read or written                   |
//! | 4    | Input could not be parsed or its columns mapped           |
//! | 5    | Findings present and `--strict` was given                 |
//! | 6    | Settings file invalid                                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use medir_io::IoError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Input file missing or unreadable, or output not writable.
pub const EXIT_IO: u8 = 3;

/// Input read but not understood: CSV syntax, workbook structure, or no
/// header matching a required column.
pub const EXIT_PARSE: u8 = 4;

/// `--strict` and the batch has calculation errors or error-level alerts.
pub const EXIT_FINDINGS: u8 = 5;

/// Settings file could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Map an ingestion error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } => EXIT_IO,
        IoError::UnsupportedFormat(_) => EXIT_USAGE,
        IoError::Csv(_)
        | IoError::Spreadsheet(_)
        | IoError::EmptyTable
        | IoError::MissingColumn { .. } => EXIT_PARSE,
    }
}
