use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::types::{Arrival, Container};

pub mod docker;
pub use docker::DockerRuntime;

/// Live sequence of change notifications.  The stream ending means the
/// subscription is gone.
pub type EventStream = BoxStream<'static, Result<Arrival, RuntimeError>>;

/// Failure talking to the container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("docker api error: {0}")]
    Docker(#[from] bollard::errors::Error),
    #[error("container not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

/// The container runtime the monitor watches.
///
/// Implementations only move data; debouncing, filtering and change
/// detection all happen in [`Monitor`](crate::Monitor).
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Subscribe to container and network change notifications.
    async fn subscribe(&self) -> Result<EventStream, RuntimeError>;

    /// IDs of every known container, stopped ones included.
    async fn list(&self) -> Result<Vec<String>, RuntimeError>;

    /// Full detail of a single container.
    async fn inspect(&self, id: &str) -> Result<Container, RuntimeError>;
}
