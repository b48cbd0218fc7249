mod assertions;
mod collection;
mod config;
mod constant;
mod database;
mod document;
mod error;
mod sandbox;
mod wal;
mod worker;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

pub use collection::{Collection, DistanceType};
pub use config::Config;
pub use constant::{ARTIFACT_EXTENSION, DEFAULT_RESOURCE_NAME, MAX_DIMENSION, TEST_RESOURCE_NAME};
pub use database::{
    AetherDB, Handover, cached_paths, is_cached, reset_for_testing, set_sync_to_disk,
    sync_to_disk,
};
pub use document::Document;
pub use error::{
    AssertionFailure, CollectionError, DatabaseError, SandboxError, TestFailure, WalError,
};
pub use sandbox::{Suite, SuiteConfig, TestSandbox, find_artifacts, sanitize_identity};
pub use worker::{WorkerQueue, run_on_new_thread};
