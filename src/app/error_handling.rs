//! Error handling utilities
//!
//! Centralized reporting for errors that end the process.

use crate::error::{describe_exit_code, ExitCode, TransformError};
use crate::transform::SelectionError;
use tracing::{debug, error};

/// Report a fatal error and exit with the matching status code.
///
/// A [`TransformError`] has already been shown to the user as a notification,
/// so only its exit code is used. Anything else is printed here, with the full
/// cause chain when `verbose >= 1`.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    let code = report_fatal_error(&error, verbose);
    debug!("Exiting with code {} ({})", code, describe_exit_code(code));
    std::process::exit(code)
}

/// Print `error` and return the process exit code for it
pub fn report_fatal_error(error: &anyhow::Error, verbose: u8) -> i32 {
    if let Some(transform_err) = error.downcast_ref::<TransformError>() {
        error!("Transform failed: {:#}", error);
        return transform_err.exit_code();
    }

    error!("Fatal error: {:#}", error);
    eprintln!("Error: {error}");

    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    if error.downcast_ref::<SelectionError>().is_some() {
        ExitCode::ARGUMENT_ERROR
    } else {
        ExitCode::GENERAL_ERROR
    }
}
