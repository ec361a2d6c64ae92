//! Per-entity overlay configuration text and the aggregate content hash.
//!
//! Visibility rules:
//!
//! - the hub lists every member; only peer members get an `Endpoint`
//!   (route members are learned from their first handshake)
//! - a peer lists the hub and every other peer
//! - a route lists the hub and every peer, never another route
//!
//! Output depends only on the records passed in. Members must arrive in a
//! stable order (the store lists them by name) for documents to be
//! byte-identical across runs.

use std::collections::BTreeMap;
use std::net::IpAddr;

use sha2::{Digest, Sha256};

use crate::model::{Hub, Member, Network};

const FORWARDING_ON: &str = "sysctl -w net.ipv4.ip_forward=1";
const FORWARDING_OFF: &str = "sysctl -w net.ipv4.ip_forward=0";

/// Render the hub's document.
pub fn hub_document(hub: &Hub, members: &[Member]) -> String {
    let mut doc = Document::interface(&hub.keys.private_key, &hub.address, hub.port);
    doc.line("PostUp", FORWARDING_ON);
    doc.line("PostDown", FORWARDING_OFF);

    for member in members {
        let endpoint = (member.kind.is_peer() && member.has_public_address())
            .then(|| endpoint(&member.public_address, member.port));
        doc.peer(
            &member.keys.public_key,
            &format!("{}/32", member.address),
            endpoint.as_deref(),
        );
    }
    doc.finish()
}

/// Render the document of `member`. `members` is the full member set of the
/// network, `member` included.
pub fn member_document(network: &Network, hub: &Hub, member: &Member, members: &[Member]) -> String {
    let mut doc = Document::interface(&member.keys.private_key, &member.address, member.port);

    // The hub routes the whole block.
    let hub_endpoint =
        (!hub.public_address.is_empty()).then(|| endpoint(&hub.public_address, hub.port));
    doc.peer(
        &hub.keys.public_key,
        &network.cidr.to_string(),
        hub_endpoint.as_deref(),
    );

    for other in members
        .iter()
        .filter(|other| other.id != member.id && other.kind.is_peer())
    {
        let endpoint = other
            .has_public_address()
            .then(|| endpoint(&other.public_address, other.port));
        doc.peer(
            &other.keys.public_key,
            &format!("{}/32", other.address),
            endpoint.as_deref(),
        );
    }
    doc.finish()
}

/// `host:port`, with IPv6 literals bracketed.
pub fn endpoint(host: &str, port: u16) -> String {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => format!("[{v6}]:{port}"),
        _ => format!("{host}:{port}"),
    }
}

/// SHA-256 over `name:document` pairs in name order, lowercase hex.
pub fn content_hash(documents: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (name, text) in documents {
        hasher.update(name.as_bytes());
        hasher.update(b":");
        hasher.update(text.as_bytes());
    }
    hex::encode(hasher.finalize())
}

// ── Text builder ─────────────────────────────────────────────────────

struct Document {
    out: String,
}

impl Document {
    fn interface(private_key: &str, address: &impl std::fmt::Display, port: u16) -> Self {
        let mut doc = Self {
            out: String::from("[Interface]\n"),
        };
        doc.line("PrivateKey", private_key);
        doc.line("Address", &format!("{address}/32"));
        doc.line("ListenPort", &port.to_string());
        doc
    }

    fn peer(&mut self, public_key: &str, allowed_ips: &str, endpoint: Option<&str>) {
        self.out.push_str("\n[Peer]\n");
        self.line("PublicKey", public_key);
        self.line("AllowedIPs", allowed_ips);
        if let Some(endpoint) = endpoint {
            self.line("Endpoint", endpoint);
        }
    }

    fn line(&mut self, key: &str, value: &str) {
        self.out.push_str(key);
        self.out.push_str(" = ");
        self.out.push_str(value);
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;

    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::keys::KeyPair;
    use crate::model::{HubId, MemberId, MemberKind, NetworkId};

    fn keys(name: &str) -> KeyPair {
        KeyPair {
            private_key: format!("{name}-private"),
            public_key: format!("{name}-public"),
        }
    }

    fn network() -> Network {
        Network {
            id: NetworkId::new(),
            name: "lab".into(),
            cidr: "10.0.0.0/24".parse().unwrap(),
            created_at: Utc::now(),
        }
    }

    fn hub(network: &Network) -> Hub {
        Hub {
            id: HubId::new(),
            network_id: network.id,
            name: "hub".into(),
            public_address: "203.0.113.1".into(),
            port: 51820,
            address: Ipv4Addr::new(10, 0, 0, 1),
            keys: keys("hub"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn member(network: &Network, name: &str, kind: MemberKind, last_octet: u8) -> Member {
        let public_address = match kind {
            MemberKind::Peer => format!("198.51.100.{last_octet}"),
            MemberKind::Route => String::new(),
        };
        Member {
            id: MemberId::new(),
            network_id: network.id,
            name: name.into(),
            public_address,
            port: 51820,
            address: Ipv4Addr::new(10, 0, 0, last_octet),
            kind,
            keys: keys(name),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn hub_document_layout() {
        let net = network();
        let members = vec![
            member(&net, "p1", MemberKind::Peer, 2),
            member(&net, "r1", MemberKind::Route, 3),
        ];

        insta::assert_snapshot!(hub_document(&hub(&net), &members), @r"
        [Interface]
        PrivateKey = hub-private
        Address = 10.0.0.1/32
        ListenPort = 51820
        PostUp = sysctl -w net.ipv4.ip_forward=1
        PostDown = sysctl -w net.ipv4.ip_forward=0

        [Peer]
        PublicKey = p1-public
        AllowedIPs = 10.0.0.2/32
        Endpoint = 198.51.100.2:51820

        [Peer]
        PublicKey = r1-public
        AllowedIPs = 10.0.0.3/32
        ");
    }

    #[test]
    fn member_document_routes_the_block_through_the_hub() {
        let net = network();
        let p1 = member(&net, "p1", MemberKind::Peer, 2);
        let members = vec![p1.clone()];

        let doc = member_document(&net, &hub(&net), &p1, &members);
        assert_eq!(
            doc,
            "[Interface]\n\
             PrivateKey = p1-private\n\
             Address = 10.0.0.2/32\n\
             ListenPort = 51820\n\
             \n\
             [Peer]\n\
             PublicKey = hub-public\n\
             AllowedIPs = 10.0.0.0/24\n\
             Endpoint = 203.0.113.1:51820\n"
        );
    }

    #[test]
    fn route_sees_peers_but_not_routes() {
        let net = network();
        let members = vec![
            member(&net, "p1", MemberKind::Peer, 2),
            member(&net, "r1", MemberKind::Route, 3),
            member(&net, "r2", MemberKind::Route, 4),
        ];
        let doc = member_document(&net, &hub(&net), &members[1], &members);

        assert!(doc.contains("p1-public"));
        assert!(doc.contains("Endpoint = 198.51.100.2:51820"));
        assert!(!doc.contains("r2-public"));
        assert!(!doc.contains("PostUp"));
    }

    #[test]
    fn endpoints() {
        assert_eq!(endpoint("203.0.113.1", 51820), "203.0.113.1:51820");
        assert_eq!(endpoint("vpn.example.com", 443), "vpn.example.com:443");
        assert_eq!(endpoint("2001:db8::1", 51820), "[2001:db8::1]:51820");
    }

    #[test]
    fn hash_is_hex_sha256_of_sorted_pairs() {
        let docs = BTreeMap::from([
            ("b".to_owned(), "two".to_owned()),
            ("a".to_owned(), "one".to_owned()),
        ]);
        let expected = hex::encode(Sha256::digest(b"a:oneb:two"));
        assert_eq!(content_hash(&docs), expected);
        assert_eq!(content_hash(&docs).len(), 64);
    }

    #[test]
    fn hash_tracks_content() {
        let mut docs = BTreeMap::from([("a".to_owned(), "one".to_owned())]);
        let before = content_hash(&docs);
        assert_eq!(content_hash(&docs.clone()), before);

        docs.insert("a".to_owned(), "one ".to_owned());
        assert_ne!(content_hash(&docs), before);
    }
}
