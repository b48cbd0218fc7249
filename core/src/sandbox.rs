//! Per-test working directories for code that drives the engine.
//!
//! A [`Suite`] owns one root directory. Each test gets a [`TestSandbox`]
//! under it, named after the test, and the sandbox checks on the way out
//! that the test closed its handles and left no data files behind.

use crate::config::Config;
use crate::constant::{
    ARTIFACT_EXTENSION, DEFAULT_RESOURCE_NAME, SANDBOX_ROOT_DIR, SANDBOX_ROOT_ENV,
    TEST_RESOURCE_NAME,
};
use crate::database::{cached_paths, reset_for_testing, set_sync_to_disk};
use crate::error::{SandboxError, TestFailure};
use std::any::Any;
use std::cell::Cell;
use std::fmt::Display;
use std::io::ErrorKind;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

const RESERVED_CHARS: [char; 3] = ['-', '[', ']'];

static QUIET_HOOK: Once = Once::new();

thread_local! {
    static PANICS_QUIET: Cell<bool> = const { Cell::new(false) };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    pub root: PathBuf,
}

impl SuiteConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        SuiteConfig { root }
    }

    /// Uses `AETHER_SANDBOX_ROOT` if set, otherwise a directory under the system temp dir.
    pub fn from_env() -> Self {
        match std::env::var_os(SANDBOX_ROOT_ENV) {
            Some(root) if !root.is_empty() => SuiteConfig::new(root),
            _ => SuiteConfig::new(std::env::temp_dir().join(SANDBOX_ROOT_DIR)),
        }
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        SuiteConfig::from_env()
    }
}

pub struct Suite {
    root: PathBuf,
}

impl Suite {
    /// Prepares the process for a run. Leftovers from an earlier run are removed.
    pub fn set_up(config: SuiteConfig) -> Self {
        if cfg!(debug_assertions) {
            set_sync_to_disk(false);
        }

        match std::fs::remove_dir_all(&config.root) {
            Ok(()) => debug!(root = %config.root.display(), "removed stale suite root"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                warn!(root = %config.root.display(), %err, "could not remove stale suite root")
            }
        }

        info!(root = %config.root.display(), "suite set up");
        Suite { root: config.root }
    }

    pub fn tear_down(self) {
        reset_for_testing();
        info!(root = %self.root.display(), "suite torn down");
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn begin_test(&self, identity: &str) -> Result<TestSandbox, SandboxError> {
        let name = sanitize_identity(identity)?;
        let root_directory = self.root.join(&name);

        match std::fs::remove_dir_all(&root_directory) {
            Ok(()) => debug!(dir = %root_directory.display(), "removed stale sandbox"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SandboxError::Io {
                    path: root_directory,
                    source,
                });
            }
        }
        std::fs::create_dir_all(&root_directory).map_err(|source| SandboxError::Io {
            path: root_directory.clone(),
            source,
        })?;

        debug!(identity = %name, dir = %root_directory.display(), "began test");
        Ok(TestSandbox {
            identity: name,
            suite_root: self.root.clone(),
            root_directory,
            leak_detected: false,
            finished: false,
        })
    }

    /// Runs `body` inside a fresh sandbox and always finalizes it.
    ///
    /// An error or panic from `body` counts as an uncaught failure, so the
    /// open-handle check is skipped. A panic is resumed once cleanup is done;
    /// unlike [`TestSandbox::assert_throws`] it still goes through the panic hook.
    pub fn run_test<E, F>(&self, identity: &str, body: F) -> Result<(), TestFailure>
    where
        E: Display,
        F: FnOnce(&mut TestSandbox) -> Result<(), E>,
    {
        let mut sandbox = self.begin_test(identity).map_err(|err| TestFailure {
            identity: identity.to_string(),
            failures: vec![err.to_string()],
        })?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut sandbox)));

        let mut failures = Vec::new();
        let payload = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => {
                sandbox.mark_leak();
                failures.push(err.to_string());
                None
            }
            Err(payload) => {
                sandbox.mark_leak();
                Some(payload)
            }
        };

        let identity = sandbox.identity.clone();
        failures.extend(sandbox.finish());

        if let Some(payload) = payload {
            for failure in &failures {
                error!(identity = %identity, %failure, "cleanup after panic failed");
            }
            panic::resume_unwind(payload);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TestFailure { identity, failures })
        }
    }
}

/// Removes the characters parameterized test names use, and rejects what is left
/// if it would not name a single directory under the suite root.
pub fn sanitize_identity(identity: &str) -> Result<String, SandboxError> {
    let name: String = identity
        .chars()
        .filter(|c| !RESERVED_CHARS.contains(c))
        .collect();

    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains(std::path::MAIN_SEPARATOR)
    {
        return Err(SandboxError::InvalidIdentity(identity.to_string()));
    }
    Ok(name)
}

/// One test's isolated directory.
pub struct TestSandbox {
    identity: String,
    suite_root: PathBuf,
    root_directory: PathBuf,
    leak_detected: bool,
    finished: bool,
}

impl TestSandbox {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Path of `name` inside the sandbox. Nothing is created.
    pub fn resource_path(&self, name: &str) -> PathBuf {
        self.root_directory.join(name)
    }

    pub fn default_resource_path(&self) -> PathBuf {
        self.resource_path(DEFAULT_RESOURCE_NAME)
    }

    pub fn test_resource_path(&self) -> PathBuf {
        self.resource_path(TEST_RESOURCE_NAME)
    }

    /// Engine configuration for the default resource of this test.
    pub fn config(&self) -> Config {
        Config::new(self.default_resource_path())
    }

    pub fn config_for(&self, name: &str) -> Config {
        Config::new(self.resource_path(name))
    }

    pub fn mark_leak(&mut self) {
        self.leak_detected = true;
    }

    pub fn leak_detected(&self) -> bool {
        self.leak_detected
    }

    pub fn end_test(mut self) -> Result<(), TestFailure> {
        let failures = self.finish();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TestFailure {
                identity: self.identity.clone(),
                failures,
            })
        }
    }

    fn finish(&mut self) -> Vec<String> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let mut failures = Vec::new();

        if !self.leak_detected {
            for path in cached_paths()
                .into_iter()
                .filter(|p| p.starts_with(&self.root_directory))
            {
                failures.push(format!("resource handle still open: {}", path.display()));
            }
        }

        reset_for_testing();

        if let Err(err) = std::fs::remove_dir_all(&self.root_directory) {
            failures.push(format!(
                "could not remove {}: {}",
                self.root_directory.display(),
                err
            ));
        }

        failures.extend(
            find_artifacts(&self.suite_root)
                .into_iter()
                .map(|path| format!("leftover file: {}", path.display())),
        );

        debug!(identity = %self.identity, failures = failures.len(), "ended test");
        failures
    }
}

impl Drop for TestSandbox {
    fn drop(&mut self) {
        let failures = self.finish();
        if failures.is_empty() {
            return;
        }
        for failure in &failures {
            error!(identity = %self.identity, %failure, "sandbox dropped without end_test");
        }
        if !std::thread::panicking() {
            panic!("test {} failed: {}", self.identity, failures.join("; "));
        }
    }
}

/// Every data file under `root`.
pub fn find_artifacts(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext == ARTIFACT_EXTENSION)
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Like `catch_unwind`, but an expected panic is not reported by the panic hook.
///
/// Only the calling thread is silenced; panics elsewhere still reach the
/// hook that was installed before the first call.
pub(crate) fn catch_quietly<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !PANICS_QUIET.with(Cell::get) {
                previous(info);
            }
        }));
    });

    let was_quiet = PANICS_QUIET.with(|quiet| quiet.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    PANICS_QUIET.with(|quiet| quiet.set(was_quiet));
    result
}

#[cfg(test)]
fn panics_quiet() -> bool {
    PANICS_QUIET.with(Cell::get)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_reserved_characters() {
        assert_eq!(sanitize_identity("-[testOpen]").unwrap(), "testOpen");
        assert_eq!(
            sanitize_identity("-[Suite testCase-with[params]]").unwrap(),
            "Suite testCasewithparams"
        );
    }

    #[test]
    fn test_sanitize_rejects_unusable_names() {
        for identity in ["", "-[]", "[..]", "a/b", "-.-"] {
            assert!(
                matches!(
                    sanitize_identity(identity),
                    Err(SandboxError::InvalidIdentity(_))
                ),
                "{identity:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_suite_config_is_absolute() {
        assert!(SuiteConfig::new("relative/root").root.is_absolute());
    }

    #[test]
    fn test_catch_quietly_restores_hook_state() {
        assert!(!panics_quiet());

        let outer = catch_quietly::<()>(|| {
            assert!(panics_quiet());
            let inner = catch_quietly::<()>(|| panic!("inner"));
            assert!(inner.is_err());
            // nesting keeps the outer call silenced
            assert!(panics_quiet());
            panic!("outer")
        });

        assert_eq!(panic_message(outer.unwrap_err().as_ref()), "outer");
        assert!(!panics_quiet());
    }

    #[test]
    fn test_catch_quietly_returns_value() {
        assert_eq!(catch_quietly(|| 7).ok(), Some(7));
        assert!(!panics_quiet());
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("boom {}", 1)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 1");
    }
}
