//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text
//! and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use hubmesh_config::ConfigError;
use hubmesh_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const STORAGE: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} not found: {identifier}")]
    #[diagnostic(
        code(hubmesh::not_found),
        help("Run: hubmesh {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} {identifier} already exists")]
    #[diagnostic(code(hubmesh::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    #[error("No free addresses left in {cidr} ({capacity} usable)")]
    #[diagnostic(
        code(hubmesh::pool_exhausted),
        help("Delete unused members or create the network over a larger CIDR.")
    )]
    PoolExhausted { cidr: String, capacity: u32 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hubmesh::validation))]
    Validation { field: String, reason: String },

    // ── Storage ──────────────────────────────────────────────────────
    #[error("Store at {path} is in use by another process")]
    #[diagnostic(
        code(hubmesh::store_locked),
        help(
            "Gave up after {waited_ms}ms. Wait for the other command to finish,\n\
             or raise store.lock_timeout_ms."
        )
    )]
    StoreLocked { path: String, waited_ms: u64 },

    #[error("Storage failure: {message}")]
    #[diagnostic(code(hubmesh::storage))]
    Storage { message: String },

    // ── Capabilities ─────────────────────────────────────────────────
    #[error("Could not generate a key pair: {reason}")]
    #[diagnostic(code(hubmesh::keygen))]
    KeyGeneration { reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(hubmesh::config),
        help("Check the settings file and HUBMESH_* environment variables.")
    )]
    Config(Box<figment::Error>),

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("Internal error: {message}")]
    #[diagnostic(code(hubmesh::internal))]
    Internal { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    #[diagnostic(code(hubmesh::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::PoolExhausted { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            Self::StoreLocked { .. } | Self::Storage { .. } => exit_code::STORAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

/// Command that lists the kind of entity a lookup failed on.
fn list_command_for(entity: &str) -> String {
    match entity {
        "network" => "network list".into(),
        "hub" => "hub show <network>".into(),
        "member" => "member list <network>".into(),
        "config version" => "config history <network>".into(),
        "document" => "config generate <network>".into(),
        _ => "network show <network>".into(),
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::NotFound { entity, identifier } => CliError::NotFound {
                list_command: list_command_for(&entity),
                resource_type: entity,
                identifier,
            },

            CoreError::DuplicateName { entity, name } => CliError::Conflict {
                resource_type: entity,
                identifier: format!("'{name}'"),
            },

            CoreError::AlreadyExists { entity, identifier } => CliError::Conflict {
                resource_type: entity,
                identifier: format!("for {identifier}"),
            },

            CoreError::PoolExhausted { cidr, capacity } => {
                CliError::PoolExhausted { cidr, capacity }
            }

            CoreError::StorageUnavailable { path, waited_ms } => {
                CliError::StoreLocked { path, waited_ms }
            }

            err @ (CoreError::Storage(_) | CoreError::Serialization(_) | CoreError::Io(_)) => {
                CliError::Storage {
                    message: err.to_string(),
                }
            }

            CoreError::KeyGeneration { reason } => CliError::KeyGeneration { reason },

            err @ (CoreError::InvalidRelease { .. }
            | CoreError::AddressConflict { .. }
            | CoreError::Internal(_)) => CliError::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Figment(inner) => CliError::Config(inner),
            ConfigError::Serialization(inner) => CliError::Internal {
                message: inner.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let cases = [
            (
                CoreError::NotFound {
                    entity: "network".into(),
                    identifier: "lab".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::DuplicateName {
                    entity: "member".into(),
                    name: "a".into(),
                },
                exit_code::CONFLICT,
            ),
            (
                CoreError::Validation {
                    field: "cidr".into(),
                    reason: "bad".into(),
                },
                exit_code::USAGE,
            ),
            (
                CoreError::StorageUnavailable {
                    path: "/tmp/x".into(),
                    waited_ms: 10,
                },
                exit_code::STORAGE,
            ),
            (
                CoreError::KeyGeneration {
                    reason: "none".into(),
                },
                exit_code::GENERAL,
            ),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }
}
