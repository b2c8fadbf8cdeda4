/// Process exit codes for the `cli-transform` binary
///
/// - 0: success
/// - 1: unclassified failure
/// - 2: invalid arguments or selections
/// - 3-8: a transform batch failed, by failure kind
pub struct ExitCode;

impl ExitCode {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const ARGUMENT_ERROR: i32 = 2;
    pub const NO_DOCUMENT: i32 = 3;
    pub const START_FAILURE: i32 = 4;
    pub const NON_ZERO_EXIT: i32 = 5;
    pub const TIMEOUT: i32 = 6;
    pub const FILESYSTEM: i32 = 7;
    pub const EDIT_FAILED: i32 = 8;
}

/// Short human description of an exit code
pub fn describe_exit_code(code: i32) -> &'static str {
    match code {
        ExitCode::SUCCESS => "success",
        ExitCode::ARGUMENT_ERROR => "invalid arguments or selections",
        ExitCode::NO_DOCUMENT => "no document to transform",
        ExitCode::START_FAILURE => "command could not be started",
        ExitCode::NON_ZERO_EXIT => "command exited with a non-zero status",
        ExitCode::TIMEOUT => "command timed out",
        ExitCode::FILESYSTEM => "temporary file error",
        ExitCode::EDIT_FAILED => "edit could not be applied",
        _ => "error",
    }
}
