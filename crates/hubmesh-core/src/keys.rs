//! Key-pair capability.
//!
//! The topology manager never derives key material itself. It asks a
//! [`KeyGenerator`] for a fresh pair per entity and stores both halves
//! verbatim. [`X25519KeyGenerator`] is the production implementation.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::CoreError;

/// Length in bytes of both halves of a key pair.
pub const KEY_LENGTH: usize = 32;

/// A base64-encoded (private, public) key pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub private_key: String,
    pub public_key: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Source of key pairs.
///
/// Every call must return a fresh, statistically unique pair.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> Result<KeyPair, CoreError>;
}

/// Curve25519 key pairs drawn from the operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct X25519KeyGenerator;

impl KeyGenerator for X25519KeyGenerator {
    fn generate(&self) -> Result<KeyPair, CoreError> {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);

        Ok(KeyPair {
            private_key: BASE64_STANDARD.encode(secret.to_bytes()),
            public_key: BASE64_STANDARD.encode(public.as_bytes()),
        })
    }
}
