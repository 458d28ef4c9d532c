use std::time::Duration;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::backoff::ReconnectPolicy;
use crate::filter::Filter;
use crate::gate::GateTimings;
use crate::options::Options;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Unix socket of the Docker daemon; the platform default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_socket: Option<String>,
    pub debounce_ms: u64,
    pub max_debounce_ms: u64,
    pub max_idle_ms: u64,
    pub pull_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect: Option<ReconnectConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// 0 retries forever.
    pub max_retries: u32,
    pub stability_window_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1_000,
            max_delay_ms: 60_000,
            max_retries: 0,
            stability_window_ms: 60_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let timings = GateTimings::default();
        Self {
            docker_socket: None,
            debounce_ms: timings.debounce.as_millis() as u64,
            max_debounce_ms: timings.max_debounce.as_millis() as u64,
            max_idle_ms: timings.max_idle.as_millis() as u64,
            pull_timeout_ms: crate::options::DEFAULT_PULL_TIMEOUT.as_millis() as u64,
            filter: None,
            reconnect: None,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("dockwatch.toml"))
            .merge(Json::file("dockwatch.json"))
            .merge(Env::prefixed("DOCKWATCH_").split("__"))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.debounce_ms == 0 || self.max_idle_ms == 0 || self.pull_timeout_ms == 0 {
            anyhow::bail!("debounce_ms, max_idle_ms and pull_timeout_ms must be positive");
        }
        if self.max_debounce_ms < self.debounce_ms {
            anyhow::bail!(
                "max_debounce_ms ({}) must not be below debounce_ms ({})",
                self.max_debounce_ms,
                self.debounce_ms
            );
        }
        if let Some(ref reconnect) = self.reconnect {
            if reconnect.min_delay_ms == 0 || reconnect.stability_window_ms == 0 {
                anyhow::bail!("reconnect.min_delay_ms and reconnect.stability_window_ms must be positive");
            }
            if reconnect.max_delay_ms < reconnect.min_delay_ms {
                anyhow::bail!(
                    "reconnect.max_delay_ms ({}) must not be below reconnect.min_delay_ms ({})",
                    reconnect.max_delay_ms,
                    reconnect.min_delay_ms
                );
            }
        }
        Ok(())
    }

    /// Monitor options described by this configuration.
    pub fn options(&self) -> Options {
        let mut options = Options::default()
            .with_debounce(Duration::from_millis(self.debounce_ms))
            .with_max_debounce(Duration::from_millis(self.max_debounce_ms))
            .with_max_idle(Duration::from_millis(self.max_idle_ms))
            .with_pull_timeout(Duration::from_millis(self.pull_timeout_ms));

        if let Some(ref filter) = self.filter {
            options = options.with_filter(filter.clone());
        }
        if let Some(ref reconnect) = self.reconnect {
            let policy = ReconnectPolicy::new(
                Duration::from_millis(reconnect.min_delay_ms),
                Duration::from_millis(reconnect.max_delay_ms),
                reconnect.max_retries,
            )
            .with_stability_window(Duration::from_millis(reconnect.stability_window_ms));
            options = options.with_reconnect(policy);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());

            let options = config.options();
            assert_eq!(options.timings, GateTimings::default());
            assert_eq!(options.pull_timeout, Duration::from_secs(30));
            assert_eq!(options.filter, Filter::accept_all());
            assert!(options.reconnect.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_and_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "dockwatch.toml",
                r#"
                debounce_ms = 250
                max_debounce_ms = 2000

                [filter]
                all = [
                    { label_equals = { key = "proxy", value = "true" } },
                    { state_equals = "running" },
                ]

                [reconnect]
                min_delay_ms = 500
                max_retries = 3
                "#,
            )?;
            jail.set_env("DOCKWATCH_MAX_IDLE_MS", "10000");
            jail.set_env("DOCKWATCH_RECONNECT__MAX_DELAY_MS", "4000");

            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config.debounce_ms, 250);
            assert_eq!(config.max_debounce_ms, 2000);
            assert_eq!(config.max_idle_ms, 10_000);

            let options = config.options();
            assert_eq!(
                options.filter,
                Filter::all([
                    Filter::label_equals("proxy", "true"),
                    Filter::state_equals("running"),
                ])
            );
            let policy = options.reconnect.expect("reconnect configured");
            assert_eq!(policy.min_delay, Duration::from_millis(500));
            assert_eq!(policy.max_delay, Duration::from_millis(4000));
            assert_eq!(policy.max_retries, 3);
            assert_eq!(policy.stability_window, Duration::from_secs(60));
            Ok(())
        });
    }

    #[test]
    fn test_rejects_max_debounce_below_debounce() {
        Jail::expect_with(|jail| {
            jail.set_env("DOCKWATCH_DEBOUNCE_MS", "500");
            jail.set_env("DOCKWATCH_MAX_DEBOUNCE_MS", "100");
            assert!(Config::load().is_err());
            Ok(())
        });
    }

    #[test]
    fn test_rejects_inverted_reconnect_delays() {
        let config = Config {
            reconnect: Some(ReconnectConfig {
                min_delay_ms: 5_000,
                max_delay_ms: 1_000,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_durations() {
        let config = Config {
            debounce_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_stability_window() {
        let config = Config {
            reconnect: Some(ReconnectConfig {
                stability_window_ms: 0,
                max_retries: 2,
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = config.validate().expect_err("zero stability window accepted");
        assert!(err.to_string().contains("stability_window_ms"));

        Jail::expect_with(|jail| {
            jail.set_env("DOCKWATCH_RECONNECT__STABILITY_WINDOW_MS", "0");
            assert!(Config::load().is_err());
            Ok(())
        });
    }
}
