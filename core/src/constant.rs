pub const MAX_DIMENSION: i32 = 65532;

/// Extension of every data file the engine writes.
pub const ARTIFACT_EXTENSION: &str = "realm";

pub const DEFAULT_RESOURCE_NAME: &str = "default.realm";
pub const TEST_RESOURCE_NAME: &str = "test.realm";

pub const LOCK_SUFFIX: &str = "lock";

pub const SANDBOX_ROOT_ENV: &str = "AETHER_SANDBOX_ROOT";
pub const SANDBOX_ROOT_DIR: &str = "aether-sandbox";
