use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::models::{ContainerInspectResponse, EventMessage};
use bollard::system::EventsOptions;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::stream::StreamExt;
use log::debug;

use super::{ContainerRuntime, EventStream, RuntimeError};
use crate::types::{Arrival, Container, Network, Port};

/// Seconds before a request to the daemon is abandoned.
const CONNECT_TIMEOUT: u64 = 120;

/// Resource types we subscribe to.
const EVENT_TYPES: &[&str] = &["container", "network"];

/// Actions that can change what a pull returns.
const EVENT_ACTIONS: &[&str] = &[
    "create",
    "start",
    "stop",
    "die",
    "kill",
    "pause",
    "unpause",
    "rename",
    "update",
    "destroy",
    "connect",
    "disconnect",
];

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the Docker daemon, either through an explicit unix socket
    /// or the platform's default one.
    pub fn connect(socket: Option<&str>) -> Result<Self, RuntimeError> {
        let docker = match socket {
            Some(path) => {
                let path = path.trim_start_matches("unix://");
                Docker::connect_with_unix(path, CONNECT_TIMEOUT, API_DEFAULT_VERSION)?
            }
            None => Docker::connect_with_local_defaults()?,
        };
        Ok(Self { docker })
    }

    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn subscribe(&self) -> Result<EventStream, RuntimeError> {
        let filters: HashMap<String, Vec<String>> = [("type", EVENT_TYPES), ("event", EVENT_ACTIONS)]
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect();
        let opts = EventsOptions::<String> {
            filters,
            ..Default::default()
        };

        let stream = self
            .docker
            .events(Some(opts))
            .map(|msg| msg.map(convert_event).map_err(RuntimeError::from));
        Ok(stream.boxed())
    }

    async fn list(&self) -> Result<Vec<String>, RuntimeError> {
        let opts = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(opts)).await?;
        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }

    async fn inspect(&self, id: &str) -> Result<Container, RuntimeError> {
        let detail = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;
        Ok(convert_container(detail))
    }
}

fn convert_event(event: EventMessage) -> Arrival {
    Arrival {
        kind: event.typ.map(|t| t.to_string()).unwrap_or_default(),
        action: event.action.unwrap_or_default(),
        actor: event.actor.and_then(|a| a.id).unwrap_or_default(),
    }
}

/// Map an inspect response onto our model.  Missing sections become empty
/// values so an absent map and an empty one look the same downstream.
fn convert_container(detail: ContainerInspectResponse) -> Container {
    let config = detail.config.unwrap_or_default();
    let settings = detail.network_settings.unwrap_or_default();

    let networks = settings
        .networks
        .unwrap_or_default()
        .into_iter()
        .map(|(name, endpoint)| Network {
            name,
            id: endpoint.network_id.unwrap_or_default(),
            ip_address: endpoint.ip_address.unwrap_or_default(),
            ip6_address: endpoint.global_ipv6_address.unwrap_or_default(),
            gateway: endpoint.gateway.unwrap_or_default(),
            aliases: endpoint.aliases.unwrap_or_default(),
        })
        .collect();

    let mut ports = Vec::new();
    for (key, bindings) in settings.ports.unwrap_or_default() {
        let Some((container_port, protocol)) = parse_port_key(&key) else {
            debug!("Skipping malformed port key {}", key);
            continue;
        };
        for binding in bindings.unwrap_or_default() {
            let Some(host_port) = binding
                .host_port
                .as_deref()
                .and_then(|p| p.parse::<u16>().ok())
            else {
                continue;
            };
            ports.push(Port {
                host_ip: binding.host_ip.unwrap_or_default(),
                host_port,
                container_port,
                protocol: protocol.to_string(),
            });
        }
    }

    Container {
        id: detail.id.unwrap_or_default(),
        name: detail
            .name
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default(),
        image: config.image.unwrap_or_default(),
        state: detail
            .state
            .and_then(|s| s.status)
            .map(|s| s.to_string())
            .unwrap_or_default(),
        labels: config.labels.unwrap_or_default(),
        networks,
        ports,
    }
}

/// Split `"80/tcp"` into its port and protocol.
fn parse_port_key(key: &str) -> Option<(u16, &str)> {
    let (port, protocol) = key.split_once('/')?;
    if protocol.contains('/') {
        return None;
    }
    Some((port.parse().ok()?, protocol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{
        ContainerConfig, ContainerState, ContainerStateStatusEnum, EndpointSettings, EventActor,
        EventMessageTypeEnum, NetworkSettings, PortBinding,
    };

    fn inspect_response() -> ContainerInspectResponse {
        ContainerInspectResponse {
            id: Some("abc123".into()),
            name: Some("/web".into()),
            state: Some(ContainerState {
                status: Some(ContainerStateStatusEnum::RUNNING),
                ..Default::default()
            }),
            config: Some(ContainerConfig {
                image: Some("nginx:latest".into()),
                labels: Some(HashMap::from([("proxy".to_string(), "true".to_string())])),
                ..Default::default()
            }),
            network_settings: Some(NetworkSettings {
                networks: Some(HashMap::from([(
                    "bridge".to_string(),
                    EndpointSettings {
                        network_id: Some("n1".into()),
                        ip_address: Some("172.17.0.2".into()),
                        global_ipv6_address: Some("".into()),
                        gateway: Some("172.17.0.1".into()),
                        aliases: Some(vec!["web".into()]),
                        ..Default::default()
                    },
                )])),
                ports: Some(HashMap::from([
                    (
                        "80/tcp".to_string(),
                        Some(vec![
                            PortBinding {
                                host_ip: Some("0.0.0.0".into()),
                                host_port: Some("8080".into()),
                            },
                            PortBinding {
                                host_ip: Some("::".into()),
                                host_port: Some("8080".into()),
                            },
                        ]),
                    ),
                    ("443/tcp".to_string(), None),
                    (
                        "53/udp".to_string(),
                        Some(vec![PortBinding {
                            host_ip: Some("127.0.0.1".into()),
                            host_port: Some("not-a-port".into()),
                        }]),
                    ),
                    (
                        "bogus".to_string(),
                        Some(vec![PortBinding {
                            host_ip: None,
                            host_port: Some("1".into()),
                        }]),
                    ),
                ])),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_convert_container_maps_fields() {
        let c = convert_container(inspect_response());
        assert_eq!(c.id, "abc123");
        assert_eq!(c.name, "web");
        assert_eq!(c.image, "nginx:latest");
        assert_eq!(c.state, "running");
        assert_eq!(c.labels.get("proxy").map(String::as_str), Some("true"));

        assert_eq!(c.networks.len(), 1);
        let net = &c.networks[0];
        assert_eq!(net.name, "bridge");
        assert_eq!(net.id, "n1");
        assert_eq!(net.ip_address, "172.17.0.2");
        assert_eq!(net.ip6_address, "");
        assert_eq!(net.gateway, "172.17.0.1");
        assert_eq!(net.aliases, vec!["web".to_string()]);
    }

    #[test]
    fn test_convert_container_skips_unusable_ports() {
        let c = convert_container(inspect_response());
        assert_eq!(c.ports.len(), 2);
        for port in &c.ports {
            assert_eq!(port.host_port, 8080);
            assert_eq!(port.container_port, 80);
            assert_eq!(port.protocol, "tcp");
        }
    }

    #[test]
    fn test_convert_container_with_missing_sections() {
        let c = convert_container(ContainerInspectResponse {
            id: Some("bare".into()),
            ..Default::default()
        });
        assert_eq!(c.id, "bare");
        assert!(c.name.is_empty());
        assert!(c.labels.is_empty());
        assert!(c.networks.is_empty());
        assert!(c.ports.is_empty());
    }

    #[test]
    fn test_parse_port_key() {
        assert_eq!(parse_port_key("80/tcp"), Some((80, "tcp")));
        assert_eq!(parse_port_key("53/udp"), Some((53, "udp")));
        assert_eq!(parse_port_key("80"), None);
        assert_eq!(parse_port_key("80/tcp/x"), None);
        assert_eq!(parse_port_key("99999/tcp"), None);
    }

    #[test]
    fn test_convert_event() {
        let arrival = convert_event(EventMessage {
            typ: Some(EventMessageTypeEnum::CONTAINER),
            action: Some("start".into()),
            actor: Some(EventActor {
                id: Some("abc123".into()),
                attributes: None,
            }),
            ..Default::default()
        });
        assert_eq!(arrival.kind, "container");
        assert_eq!(arrival.action, "start");
        assert_eq!(arrival.actor, "abc123");
    }
}
