//! Process runner
//!
//! Runs one shell command per [`Invocation`], feeding it text on stdin and
//! collecting stdout, stderr and the exit code into an [`ExecutionResult`].

pub mod builder;
pub mod error;
pub mod mock;
pub mod output;
pub mod runner;


pub use builder::InvocationBuilder;
pub use error::ProcessError;
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use output::{MemoryOutput, OutputSink, TracingOutput};
pub use runner::{
    ExecutionResult, Invocation, ProcessRunner, TokioProcessRunner, START_FAILURE_EXIT_CODE,
    TIMEOUT_EXIT_CODE,
};
