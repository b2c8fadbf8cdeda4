use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use super::runner::{ExecutionResult, Invocation, ProcessRunner};

type Responder = Box<dyn Fn(&Invocation) -> ExecutionResult + Send + Sync>;
type Matcher = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

/// Test double for [`ProcessRunner`] driven by expectations.
///
/// Expectations are checked in registration order; the first whose matcher
/// accepts the invocation answers it. Unmatched invocations resolve as a start
/// failure so tests see them as ordinary failures.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    call_history: Arc<Mutex<Vec<Invocation>>>,
}

struct MockExpectation {
    matcher: Matcher,
    responder: Responder,
    times_called: usize,
    expected_times: Option<usize>,
}

pub struct MockCommandConfig {
    runner: MockProcessRunner,
    matcher: Matcher,
    response: ExecutionResult,
    responder: Option<Responder>,
    expected_times: Option<usize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect invocations whose command line starts with `prefix`
    pub fn expect_command(&self, prefix: &str) -> MockCommandConfig {
        let prefix = prefix.to_string();
        self.expect_matching(move |invocation| invocation.command.starts_with(&prefix))
    }

    pub fn expect_matching<F>(&self, matcher: F) -> MockCommandConfig
    where
        F: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        MockCommandConfig {
            runner: self.clone(),
            matcher: Box::new(matcher),
            response: ExecutionResult::default(),
            responder: None,
            expected_times: None,
        }
    }

    pub fn call_count(&self) -> usize {
        lock(&self.call_history).len()
    }

    pub fn verify_called(&self, prefix: &str, times: usize) -> bool {
        lock(&self.call_history)
            .iter()
            .filter(|invocation| invocation.command.starts_with(prefix))
            .count()
            == times
    }

    pub fn get_call_history(&self) -> Vec<Invocation> {
        lock(&self.call_history).clone()
    }

    pub fn reset(&self) {
        lock(&self.expectations).clear();
        lock(&self.call_history).clear();
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, invocation: Invocation) -> ExecutionResult {
        lock(&self.call_history).push(invocation.clone());

        let mut expectations = lock(&self.expectations);
        for expectation in expectations.iter_mut() {
            if !(expectation.matcher)(&invocation) {
                continue;
            }

            expectation.times_called += 1;
            if let Some(expected) = expectation.expected_times {
                if expectation.times_called > expected {
                    return ExecutionResult::start_failure(format!(
                        "mock: `{}` called {} times, expected {}",
                        invocation.command, expectation.times_called, expected
                    ));
                }
            }

            return (expectation.responder)(&invocation);
        }

        ExecutionResult::start_failure(format!(
            "mock: no expectation for `{}`",
            invocation.command
        ))
    }
}

impl MockCommandConfig {
    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.response.stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.response.stderr = stderr.to_string();
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        self.response.exit_code = code;
        self
    }

    /// Compute the result from the invocation instead of a fixed response
    pub fn responds_with<F>(mut self, responder: F) -> Self
    where
        F: Fn(&Invocation) -> ExecutionResult + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        self.expected_times = Some(n);
        self
    }

    pub fn finish(self) {
        let responder = match self.responder {
            Some(responder) => responder,
            None => {
                let response = self.response;
                Box::new(move |_: &Invocation| response.clone()) as Responder
            }
        };

        lock(&self.runner.expectations).push(MockExpectation {
            matcher: self.matcher,
            responder,
            times_called: 0,
            expected_times: self.expected_times,
        });
    }
}
