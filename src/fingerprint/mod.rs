// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Content fingerprints for workflow steps.
//!
//! A step's fingerprint combines the identity of its component, its
//! descriptor, and one token per input entry:
//!
//! * `literal:<hash>` for a constant, where `<hash>` is the serializer's hash
//!   of the value
//! * `connection:<hash>:<output>` for a connection, where `<hash>` is the
//!   upstream fingerprint (at load time) or the hash of the delivered value
//!   (at run time)
//!
//! Ports are ordered by name and entries keep their declared order. If any
//! token is unhashable the whole step is [`Fingerprint::Unhashable`].

mod engine;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::traits::ComponentClass;
use crate::workflow::ComponentDef;

pub use engine::compute_step_hashes;

/// Text used for the unhashable sentinel in logs and reports.
pub const UNHASHABLE: &str = "UNHASHABLE";

/// Hex SHA-256 digest, or the sentinel for content that cannot be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fingerprint {
    Digest(String),
    Unhashable,
}

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Fingerprint::Digest(sha256_hex(bytes))
    }

    pub fn is_unhashable(&self) -> bool {
        matches!(self, Fingerprint::Unhashable)
    }

    pub fn digest(&self) -> Option<&str> {
        match self {
            Fingerprint::Digest(hex) => Some(hex),
            Fingerprint::Unhashable => None,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Digest(hex) => f.write_str(hex),
            Fingerprint::Unhashable => f.write_str(UNHASHABLE),
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Per-port hash tokens collected for one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputTokens {
    ports: BTreeMap<String, Vec<String>>,
    unhashable: bool,
}

impl InputTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `port` so that an empty port still contributes to the hash.
    pub fn port(&mut self, port: &str) -> &mut Self {
        self.ports.entry(port.to_string()).or_default();
        self
    }

    pub fn push_literal(&mut self, port: &str, value_hash: &Fingerprint) {
        match value_hash {
            Fingerprint::Digest(hex) => self.push(port, format!("literal:{}", hex)),
            Fingerprint::Unhashable => self.unhashable = true,
        }
    }

    pub fn push_connection(&mut self, port: &str, upstream: &Fingerprint, output_name: &str) {
        match upstream {
            Fingerprint::Digest(hex) => {
                self.push(port, format!("connection:{}:{}", hex, output_name))
            }
            Fingerprint::Unhashable => self.unhashable = true,
        }
    }

    pub fn is_unhashable(&self) -> bool {
        self.unhashable
    }

    pub fn ports(&self) -> &BTreeMap<String, Vec<String>> {
        &self.ports
    }

    fn push(&mut self, port: &str, token: String) {
        self.ports.entry(port.to_string()).or_default().push(token);
    }
}

/// Default combination of a component identity, its descriptor and its input
/// tokens: SHA-256 over their canonical JSON encoding.
pub fn combine(identity: &str, def: &ComponentDef, ports: &BTreeMap<String, Vec<String>>) -> Fingerprint {
    let document = json!({
        "component": identity,
        "descriptor": def.0,
        "inputs": ports,
    });
    Fingerprint::of_bytes(document.to_string().as_bytes())
}

/// Fingerprint of a step given its collected tokens. Short-circuits to
/// `Unhashable` before the component gets a say.
pub fn step_fingerprint(class: &dyn ComponentClass, def: &ComponentDef, tokens: &InputTokens) -> Fingerprint {
    if tokens.is_unhashable() {
        return Fingerprint::Unhashable;
    }
    class.compute_hash(def, tokens.ports())
}
