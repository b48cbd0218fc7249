use crate::error::AssertionFailure;
use crate::sandbox::{TestSandbox, catch_quietly, panic_message};
use std::fmt::{Debug, Display};

impl TestSandbox {
    /// Expects `operation` to panic, with a message containing `expected` if given.
    ///
    /// Marks the sandbox as leaking first: a panicking operation may leave handles open.
    /// The expected panic is kept out of the test output.
    pub fn assert_throws<R>(
        &mut self,
        operation: impl FnOnce() -> R,
        expected: Option<&str>,
    ) -> Result<(), AssertionFailure> {
        self.mark_leak();

        let payload = match catch_quietly(operation) {
            Ok(_) => return Err(AssertionFailure::NoPanic),
            Err(payload) => payload,
        };

        let actual = panic_message(payload.as_ref());
        match expected {
            Some(expected) if !actual.contains(expected) => Err(AssertionFailure::WrongPanic {
                expected: expected.to_string(),
                actual,
            }),
            _ => Ok(()),
        }
    }

    pub fn assert_succeeds<T, E: Display>(
        &self,
        operation: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, AssertionFailure> {
        operation().map_err(|err| AssertionFailure::UnexpectedError(err.to_string()))
    }

    /// Passes only when `operation` fails with exactly `expected`.
    pub fn assert_fails<T: Debug, E: PartialEq + Debug>(
        &self,
        expected: E,
        operation: impl FnOnce() -> Result<T, E>,
    ) -> Result<(), AssertionFailure> {
        match operation() {
            Ok(value) => Err(AssertionFailure::UnexpectedSuccess(format!("{:?}", value))),
            Err(actual) if actual == expected => Ok(()),
            Err(actual) => Err(AssertionFailure::WrongError {
                expected: format!("{:?}", expected),
                actual: format!("{:?}", actual),
            }),
        }
    }

    pub fn assert_nil<T: Debug>(
        &self,
        expression: impl FnOnce() -> Option<T>,
    ) -> Result<(), AssertionFailure> {
        match expression() {
            None => Ok(()),
            Some(value) => Err(AssertionFailure::NotNil(format!("{:?}", value))),
        }
    }
}
