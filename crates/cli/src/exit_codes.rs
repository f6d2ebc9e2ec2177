//! CLI Exit Code Registry
//!
//! Single source of truth for `cjoin` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, unreadable stdin)             |
//! | 3    | Unmatched records remain (`match --strict`)          |
//! | 4    | Invalid config or exception tables                   |
//! | 5    | Input collection, listing or shard dir unavailable   |
//! | 6    | Output could not be written                          |
//!
//! Adding a code: add the constant, document its trigger, update the table.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// `match --strict` found left-only or right-only records.
pub const EXIT_UNMATCHED: u8 = 3;

/// Config or tables failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// An input file or directory is missing, unreadable or not in its format.
pub const EXIT_SOURCE_UNAVAILABLE: u8 = 5;

/// Writing an output (map files, shards, archive) failed. Inputs are intact.
pub const EXIT_PERSISTENCE: u8 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_UNMATCHED,
            EXIT_INVALID_CONFIG,
            EXIT_SOURCE_UNAVAILABLE,
            EXIT_PERSISTENCE,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
