//! Order-insensitive fingerprints used for change detection.
//!
//! Scalars are digested in a fixed order; every unordered collection
//! (labels, networks, ports, aliases and the container set itself) is
//! reduced with a wrapping sum of independently digested members, so
//! reordering never changes the result while any edit to a member does.
//! An absent collection and an empty one both fold to zero.
//!
//! Fingerprints are 64 bits wide.  Two different snapshots sharing a
//! fingerprint would suppress one delivery; that risk is accepted.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::types::{Container, Network, Port};

/// 64-bit digest of a container or a set of containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Length-prefixed field writer so `("ab", "c")` and `("a", "bc")` differ.
struct FieldHasher(Sha256);

impl FieldHasher {
    fn new(tag: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(tag);
        Self(hasher)
    }

    fn str(&mut self, value: &str) -> &mut Self {
        self.0.update((value.len() as u64).to_le_bytes());
        self.0.update(value.as_bytes());
        self
    }

    fn u16(&mut self, value: u16) -> &mut Self {
        self.0.update(value.to_le_bytes());
        self
    }

    fn u64(&mut self, value: u64) -> &mut Self {
        self.0.update(value.to_le_bytes());
        self
    }

    fn finish(&mut self) -> u64 {
        let digest = std::mem::take(&mut self.0).finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }
}

fn fold(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(0, u64::wrapping_add)
}

fn port_digest(port: &Port) -> u64 {
    FieldHasher::new(b"port")
        .str(&port.host_ip)
        .u16(port.host_port)
        .u16(port.container_port)
        .str(&port.protocol)
        .finish()
}

fn network_digest(network: &Network) -> u64 {
    let aliases = fold(
        network
            .aliases
            .iter()
            .map(|alias| FieldHasher::new(b"alias").str(alias).finish()),
    );
    FieldHasher::new(b"network")
        .str(&network.name)
        .str(&network.id)
        .str(&network.ip_address)
        .str(&network.ip6_address)
        .str(&network.gateway)
        .u64(aliases)
        .finish()
}

fn container_digest(container: &Container) -> u64 {
    let labels = fold(
        container
            .labels
            .iter()
            .map(|(k, v)| FieldHasher::new(b"label").str(k).str(v).finish()),
    );
    let networks = fold(container.networks.iter().map(network_digest));
    let ports = fold(container.ports.iter().map(port_digest));

    FieldHasher::new(b"container")
        .str(&container.id)
        .str(&container.name)
        .str(&container.image)
        .str(&container.state)
        .u64(labels)
        .u64(networks)
        .u64(ports)
        .finish()
}

impl Fingerprint {
    pub fn of(container: &Container) -> Self {
        Fingerprint(container_digest(container))
    }

    /// Fingerprint of a whole snapshot, independent of member order.
    pub fn of_all<'a>(containers: impl IntoIterator<Item = &'a Container>) -> Self {
        Fingerprint(fold(containers.into_iter().map(container_digest)))
    }
}
