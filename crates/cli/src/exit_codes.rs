//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (cancelled, unspecified)               |
//! | 2    | Usage error (bad args, invalid config)               |
//! | 3    | Startlist parse error                                |
//! | 4    | Catalog load error                                   |
//! | 5    | XML export error                                     |
//! | 6    | Database mutation error                              |
//! | 7    | CDB converter error                                  |
//! | 8    | Export completed but some records stayed unmatched   |

use velostart_engine::EngineError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options, bad config.
pub const EXIT_USAGE: u8 = 2;

/// The startlist document could not be parsed.
pub const EXIT_PARSE: u8 = 3;

/// The reference catalog could not be loaded.
pub const EXIT_CATALOG: u8 = 4;

/// The startlist XML could not be written.
pub const EXIT_EXPORT: u8 = 5;

/// The database mutation failed; the source database is untouched.
pub const EXIT_MUTATION: u8 = 6;

/// The external CDB converter failed or was not found.
pub const EXIT_CONVERSION: u8 = 7;

/// The run completed but some teams or riders stayed unmatched.
pub const EXIT_UNMATCHED: u8 = 8;

/// Map an engine error to its exit code.
pub fn error_exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::Parse(_) => EXIT_PARSE,
        EngineError::Config(_) => EXIT_USAGE,
        EngineError::CatalogLoad(_) => EXIT_CATALOG,
        EngineError::Export(_) => EXIT_EXPORT,
        EngineError::Mutation(_) => EXIT_MUTATION,
        EngineError::Conversion(_) => EXIT_CONVERSION,
        EngineError::Cancelled(_) => EXIT_ERROR,
    }
}
