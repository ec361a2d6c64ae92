//! Input validation capability.
//!
//! The topology manager validates names, blocks and public addresses through
//! the [`Validator`] trait so it can be unit-tested with a scripted double
//! (see [`crate::testing::ScriptedValidator`]).

use std::net::IpAddr;

use ipnet::Ipv4Net;

use crate::error::CoreError;

/// Hostnames accepted without a dot.
const LOOPBACK_ALIASES: &[&str] = &["localhost"];

pub trait Validator: Send + Sync {
    /// Network names: non-empty, ASCII letter first, ASCII alphanumerics only.
    fn network_name(&self, name: &str) -> Result<(), CoreError>;

    /// CIDR syntax only. Usability of the block is the pool's concern.
    fn cidr(&self, cidr: &str) -> Result<(), CoreError>;

    /// IP literal or hostname reachable by other entities.
    fn public_address(&self, address: &str) -> Result<(), CoreError>;

    /// Hub and member names. They key generated documents, so blanks,
    /// whitespace and control characters are rejected.
    fn entity_name(&self, field: &str, name: &str) -> Result<(), CoreError> {
        if name.is_empty() {
            return Err(CoreError::validation(field, "cannot be empty"));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CoreError::validation(
                field,
                format!("{name:?} must not contain whitespace or control characters"),
            ));
        }
        Ok(())
    }

    /// Listen port for an explicitly supplied value.
    fn port(&self, port: u16) -> Result<(), CoreError> {
        if port == 0 {
            return Err(CoreError::validation("port", "must be between 1 and 65535"));
        }
        Ok(())
    }
}

/// Production rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl Validator for DefaultValidator {
    fn network_name(&self, name: &str) -> Result<(), CoreError> {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(CoreError::validation("network name", "cannot be empty"));
        };
        if !first.is_ascii_alphabetic() || !chars.all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::validation(
                "network name",
                format!("'{name}' must start with a letter and contain only letters and digits"),
            ));
        }
        Ok(())
    }

    fn cidr(&self, cidr: &str) -> Result<(), CoreError> {
        parse_cidr(cidr).map(|_| ())
    }

    fn public_address(&self, address: &str) -> Result<(), CoreError> {
        if address.is_empty() {
            return Err(CoreError::validation("public address", "cannot be empty"));
        }
        if address.parse::<IpAddr>().is_ok() {
            return Ok(());
        }
        if address.chars().any(char::is_whitespace) {
            return Err(CoreError::validation(
                "public address",
                format!("'{address}' contains whitespace"),
            ));
        }
        if !address.contains('.') && !LOOPBACK_ALIASES.contains(&address) {
            return Err(CoreError::validation(
                "public address",
                format!("'{address}' is neither an IP address nor a domain name"),
            ));
        }
        Ok(())
    }
}

/// Parse an IPv4 block, rejecting IPv6 and malformed input.
pub(crate) fn parse_cidr(cidr: &str) -> Result<Ipv4Net, CoreError> {
    let trimmed = cidr.trim();
    if trimmed.contains(':') {
        return Err(CoreError::validation(
            "cidr",
            format!("'{cidr}' is not an IPv4 block; only IPv4 is supported"),
        ));
    }
    trimmed
        .parse::<Ipv4Net>()
        .map_err(|e| CoreError::validation("cidr", format!("'{cidr}': {e}")))
}
