// ── Runtime configuration ──
//
// These types describe *where* the store lives and which defaults the
// topology manager applies. They never touch disk themselves: the CLI (via
// hubmesh-config) builds them and hands them in.

use std::path::PathBuf;
use std::time::Duration;

/// Conventional overlay listen port, applied when none is given.
pub const DEFAULT_LISTEN_PORT: u16 = 51820;

/// How to open the persistent store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file. Created on first open.
    pub path: PathBuf,
    /// Upper bound on waiting for another handle to release the file lock.
    pub lock_timeout: Duration,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: Duration::from_secs(1),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

/// Defaults applied by the topology manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyConfig {
    pub default_listen_port: u16,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            default_listen_port: DEFAULT_LISTEN_PORT,
        }
    }
}
