// ── Typed request structs for topology mutations ──
//
// `None` fields fall back to configured defaults on create and to the
// current value on update.

use serde::{Deserialize, Serialize};

use crate::model::MemberKind;

// ── Hub ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHubRequest {
    pub name: String,
    pub public_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHubRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

// ── Member ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    /// Required for peers, optional for routes.
    #[serde(default)]
    pub public_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MemberKind>,
}

impl CreateMemberRequest {
    pub fn peer(name: impl Into<String>, public_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_address: public_address.into(),
            port: None,
            kind: Some(MemberKind::Peer),
        }
    }

    pub fn route(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_address: String::new(),
            port: None,
            kind: Some(MemberKind::Route),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    /// `Some("")` clears the address, which only a route member may do.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MemberKind>,
}
