//! Watch a container runtime and get told when the containers you care
//! about change.
//!
//! Raw runtime events are coalesced by a debounce gate, the full state is
//! pulled and filtered, and the callback only fires when the filtered
//! snapshot's fingerprint differs from the last one delivered.
//!
//! ```no_run
//! use dockwatch::{Container, DockerRuntime, Filter, Monitor, Options};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let runtime = DockerRuntime::connect(None)?;
//! let options = Options::default().with_filter(Filter::all([
//!     Filter::label_equals("proxy.enable", "true"),
//!     Filter::state_equals("running"),
//! ]));
//! let callback = |containers: &[Container]| {
//!     for c in containers {
//!         println!("{} {}", c.name, c.image);
//!     }
//! };
//!
//! let cancel = CancellationToken::new();
//! let mut monitor = Monitor::new(runtime, callback, options);
//! let reason = monitor.run(&cancel).await;
//! println!("monitor stopped: {reason}");
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod config;
pub mod error;
pub mod filter;
pub mod gate;
pub mod hash;
pub mod monitor;
pub mod observer;
pub mod options;
pub mod runtime;
pub mod types;

pub use backoff::ReconnectPolicy;
pub use config::Config;
pub use error::Error;
pub use filter::Filter;
pub use hash::Fingerprint;
pub use monitor::Monitor;
pub use observer::{LogObserver, MonitorEvent, Observer};
pub use options::Options;
pub use runtime::{ContainerRuntime, DockerRuntime, EventStream, RuntimeError};
pub use types::{Arrival, Container, Network, Port};
