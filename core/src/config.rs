use crate::constant::DEFAULT_RESOURCE_NAME;
use std::path::{Path, PathBuf};

/// Where a database handle is opened. Passed explicitly to [`crate::AetherDB::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub path: PathBuf,
}

impl Config {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Config { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_RESOURCE_NAME)
    }
}
