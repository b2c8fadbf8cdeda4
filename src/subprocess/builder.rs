use std::path::Path;
use std::time::Duration;

use crate::subprocess::Invocation;

/// Builds an [`Invocation`].
///
/// `shell` takes a trusted command line as-is. `program` and `arg` quote every
/// token, so values from configuration or the filesystem reach the program as
/// single arguments no matter what characters they contain.
pub struct InvocationBuilder {
    invocation: Invocation,
}

impl InvocationBuilder {
    pub fn shell(command_line: &str) -> Self {
        Self {
            invocation: Invocation::new(command_line, ""),
        }
    }

    pub fn program(program: &str) -> Self {
        Self::shell(&shell_words::quote(program))
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.invocation.command.push(' ');
        self.invocation.command.push_str(&shell_words::quote(arg));
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().fold(self, |builder, arg| builder.arg(arg.as_ref()))
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(&path.to_string_lossy())
    }

    pub fn input(mut self, input: &str) -> Self {
        self.invocation.input = input.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.invocation.timeout = timeout;
        self
    }

    pub fn build(self) -> Invocation {
        self.invocation
    }
}
