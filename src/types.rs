//! Data structures used throughout the watcher.
//!
//! These types are serialised using [`serde`](https://serde.rs/) so
//! consumers can hand snapshots straight to config generators or print
//! them as JSON.  A [`Container`] is an immutable snapshot: every pull
//! builds a fresh set and the previous one is discarded wholesale.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A container's relevant state at the time of the last pull.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Full container ID.
    pub id: String,
    /// Container name without the leading slash.
    pub name: String,
    /// Image reference, e.g. `nginx:latest`.
    pub image: String,
    /// Runtime state such as `running`, `exited` or `paused`.  The runtime
    /// owns the set of legal values, so this is an open string.
    pub state: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub networks: Vec<Network>,
    #[serde(default)]
    pub ports: Vec<Port>,
}

/// A container's attachment to one network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub id: String,
    pub ip_address: String,
    /// Global IPv6 address, empty when the network has none.
    pub ip6_address: String,
    pub gateway: String,
    /// DNS aliases on this network.  Order carries no meaning.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A published port mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub host_ip: String,
    pub host_port: u16,
    pub container_port: u16,
    /// `tcp` or `udp`.
    pub protocol: String,
}

/// A single change notification received from the runtime.
///
/// Only used to wake the refresh gate; the monitor never derives state
/// from it, so unknown kinds and actions are harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arrival {
    /// Resource type, e.g. `container` or `network`.
    pub kind: String,
    /// Action, e.g. `start` or `disconnect`.
    pub action: String,
    /// ID of the resource the action applies to.
    pub actor: String,
}
