use crate::{Suite, SuiteConfig, reset_for_testing};
use tempfile::TempDir;

/// A suite rooted in its own temp dir, torn down on drop.
pub struct TestSuite {
    suite: Option<Suite>,
    _dir: TempDir,
}

impl TestSuite {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp directory");
        let suite = Suite::set_up(SuiteConfig::new(dir.path().join("sandboxes")));
        TestSuite {
            suite: Some(suite),
            _dir: dir,
        }
    }
}

impl std::ops::Deref for TestSuite {
    type Target = Suite;

    fn deref(&self) -> &Suite {
        self.suite.as_ref().expect("suite already torn down")
    }
}

impl Drop for TestSuite {
    fn drop(&mut self) {
        match self.suite.take() {
            Some(suite) => suite.tear_down(),
            None => reset_for_testing(),
        }
    }
}
