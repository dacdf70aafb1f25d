//! Errno-style status codes.
//!
//! A response status of `0` means success. Failures carry the negated
//! errno value, so clients can print a familiar diagnostic.

/// Success.
pub const OK: i32 = 0;
/// No such file or directory: unknown status attribute.
pub const ENOENT: i32 = 2;
/// No such process: the eater is dead.
pub const ESRCH: i32 = 3;
/// I/O error: an unexpected handler failure.
pub const EIO: i32 = 5;
/// Out of memory: a postponed event could not be queued.
pub const ENOMEM: i32 = 12;
/// Invalid argument: missing or malformed attribute.
pub const EINVAL: i32 = 22;

/// Human-readable description of a (possibly negated) status code.
pub const fn describe(status: i32) -> &'static str {
    match status.unsigned_abs() {
        0 => "success",
        2 => "no such file or directory",
        3 => "no such process",
        5 => "input/output error",
        12 => "cannot allocate memory",
        22 => "invalid argument",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negated_codes_are_described() {
        assert_eq!(describe(-EINVAL), "invalid argument");
        assert_eq!(describe(-ENOMEM), "cannot allocate memory");
        assert_eq!(describe(OK), "success");
        assert_eq!(describe(-99), "unknown error");
    }
}
