//! Test doubles for the topology manager's capabilities.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use hubmesh_core::testing::{ScriptedValidator, SequentialKeyGenerator};
//! use hubmesh_core::{Store, TopologyConfig, TopologyManager};
//!
//! let store = Arc::new(Store::open_in_memory().unwrap());
//! let manager = TopologyManager::new(store, TopologyConfig::default())
//!     .with_validator(ScriptedValidator::accept_all().reject("blocked"))
//!     .with_key_generator(SequentialKeyGenerator::new());
//!
//! assert!(manager.create_network("blocked", "10.0.0.0/24").is_err());
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::CoreError;
use crate::keys::{KeyGenerator, KeyPair};
use crate::validate::Validator;

// ── Validator ────────────────────────────────────────────────────────

/// Accepts everything except values registered with [`reject`](Self::reject),
/// and records each check as `"<check>:<value>"`.
#[derive(Debug, Default)]
pub struct ScriptedValidator {
    rejected: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedValidator {
    pub fn accept_all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reject(mut self, value: impl Into<String>) -> Self {
        self.rejected.insert(value.into());
        self
    }

    /// Checks performed so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check(&self, field: &str, value: &str) -> Result<(), CoreError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{field}:{value}"));
        if self.rejected.contains(value) {
            return Err(CoreError::validation(field, format!("'{value}' rejected by script")));
        }
        Ok(())
    }
}

impl Validator for ScriptedValidator {
    fn network_name(&self, name: &str) -> Result<(), CoreError> {
        self.check("network name", name)
    }

    fn cidr(&self, cidr: &str) -> Result<(), CoreError> {
        self.check("cidr", cidr)
    }

    fn public_address(&self, address: &str) -> Result<(), CoreError> {
        self.check("public address", address)
    }

    fn entity_name(&self, field: &str, name: &str) -> Result<(), CoreError> {
        self.check(field, name)
    }

    fn port(&self, port: u16) -> Result<(), CoreError> {
        self.check("port", &port.to_string())
    }
}

// ── Key generators ───────────────────────────────────────────────────

/// Deterministic pairs: `private-1`/`public-1`, `private-2`/`public-2`, ...
#[derive(Debug, Default)]
pub struct SequentialKeyGenerator {
    issued: AtomicU32,
}

impl SequentialKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyGenerator for SequentialKeyGenerator {
    fn generate(&self) -> Result<KeyPair, CoreError> {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(KeyPair {
            private_key: format!("private-{n}"),
            public_key: format!("public-{n}"),
        })
    }
}

/// Fails every call after the first `succeed_first` calls.
#[derive(Debug, Default)]
pub struct FailingKeyGenerator {
    succeed_first: u32,
    calls: AtomicU32,
}

impl FailingKeyGenerator {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn after(succeed_first: u32) -> Self {
        Self {
            succeed_first,
            calls: AtomicU32::new(0),
        }
    }
}

impl KeyGenerator for FailingKeyGenerator {
    fn generate(&self) -> Result<KeyPair, CoreError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n < self.succeed_first {
            return Ok(KeyPair {
                private_key: format!("private-{n}"),
                public_key: format!("public-{n}"),
            });
        }
        Err(CoreError::KeyGeneration {
            reason: "entropy source unavailable".into(),
        })
    }
}
