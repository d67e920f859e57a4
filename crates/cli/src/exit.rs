//! Process exit codes.
//!
//! Each API error kind gets its own code so scripts can branch on the outcome
//! without parsing stderr. A timed-out command exits with 124, matching
//! `timeout(1)`.

use std::process::ExitCode;

use apiclient::{ApiError, ErrorKind};

use crate::config::ConfigError;

pub const GENERAL_FAILURE: u8 = 1;
pub const USAGE: u8 = 2;
pub const TIMED_OUT: u8 = 124;
pub const INTERRUPTED: u8 = 130;

/// Code for a failure of the given kind.
pub fn code_for_kind(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::BadRequest => 3,
        ErrorKind::Authentication => 4,
        ErrorKind::Unauthorised => 5,
        ErrorKind::NotFound => 6,
        ErrorKind::Conflict => 7,
        ErrorKind::StaleWrite => 8,
        ErrorKind::InvalidStateTransition => 9,
        ErrorKind::LicenceCapability => 10,
        ErrorKind::Server => 11,
        ErrorKind::Store => 12,
        ErrorKind::AmbiguousName => 13,
        ErrorKind::DeadlineExceeded => TIMED_OUT,
        ErrorKind::Cancelled => INTERRUPTED,
        ErrorKind::Transport => GENERAL_FAILURE,
    }
}

/// Picks the exit code for a failed command.
pub fn code_for_error(err: &anyhow::Error) -> u8 {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        return code_for_kind(api.kind());
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return USAGE;
    }
    GENERAL_FAILURE
}

pub fn exit_code(result: &anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(code_for_error(err)),
    }
}
