//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                       |
//! |------|-----------------------------------------------|
//! | 0    | Success                                       |
//! | 1    | Operation error (unspecified failure)         |
//! | 2    | Usage error (bad arguments, bad flag values)  |
//! | 3    | I/O error (missing or unreadable file)        |
//! | 4    | Parse error (bad schema, bad CSV, bad events) |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed flag values.
pub const EXIT_USAGE: u8 = 2;

/// I/O error - file missing, unreadable, or unwritable.
pub const EXIT_IO: u8 = 3;

/// Parse error - schema, data, or event file did not parse.
pub const EXIT_PARSE: u8 = 4;
