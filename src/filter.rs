//! Composable container filters.
//!
//! A [`Filter`] is plain data: combinators hold their children instead of
//! closures, so a filter can be declared in a config file, cloned freely
//! and evaluated any number of times without side effects.
//!
//! ```toml
//! [filter]
//! all = [
//!     { label_equals = { key = "proxy.enable", value = "true" } },
//!     { state_equals = "running" },
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::types::Container;

/// Predicate over a [`Container`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Matches when every child matches.  An empty list matches everything.
    All(Vec<Filter>),
    /// Matches when at least one child matches.  An empty list matches nothing.
    Any(Vec<Filter>),
    Not(Box<Filter>),
    /// Matches when the label is present, whatever its value.
    LabelExists(String),
    /// Matches when the label is present with exactly this value.
    LabelEquals { key: String, value: String },
    StateEquals(String),
}

impl Filter {
    /// Filter that accepts every container.
    pub fn accept_all() -> Self {
        Filter::All(Vec::new())
    }

    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::All(filters.into_iter().collect())
    }

    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Any(filters.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn label_exists(key: impl Into<String>) -> Self {
        Filter::LabelExists(key.into())
    }

    pub fn label_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::LabelEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn state_equals(state: impl Into<String>) -> Self {
        Filter::StateEquals(state.into())
    }

    /// Evaluate the filter against one container.
    pub fn matches(&self, container: &Container) -> bool {
        match self {
            Filter::All(filters) => filters.iter().all(|f| f.matches(container)),
            Filter::Any(filters) => filters.iter().any(|f| f.matches(container)),
            Filter::Not(filter) => !filter.matches(container),
            Filter::LabelExists(key) => container.labels.contains_key(key),
            Filter::LabelEquals { key, value } => {
                container.labels.get(key).is_some_and(|v| v == value)
            }
            Filter::StateEquals(state) => container.state == *state,
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::accept_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(state: &str, labels: &[(&str, &str)]) -> Container {
        Container {
            id: "c1".into(),
            name: "web".into(),
            image: "nginx:latest".into(),
            state: state.into(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_all_matches_and_empty_any_does_not() {
        let c = container("running", &[]);
        assert!(Filter::all([]).matches(&c));
        assert!(!Filter::any([]).matches(&c));
    }

    #[test]
    fn test_all_requires_every_child() {
        let c = container("running", &[("proxy", "true")]);
        let f = Filter::all([
            Filter::state_equals("running"),
            Filter::label_equals("proxy", "true"),
        ]);
        assert!(f.matches(&c));

        let stopped = container("exited", &[("proxy", "true")]);
        assert!(!f.matches(&stopped));
    }

    #[test]
    fn test_any_requires_one_child() {
        let c = container("paused", &[]);
        let f = Filter::any([
            Filter::state_equals("running"),
            Filter::state_equals("paused"),
        ]);
        assert!(f.matches(&c));
        assert!(!f.matches(&container("exited", &[])));
    }

    #[test]
    fn test_double_negation_is_identity() {
        let filters = [
            Filter::state_equals("running"),
            Filter::label_exists("proxy"),
            Filter::all([]),
            Filter::any([]),
        ];
        let containers = [
            container("running", &[("proxy", "")]),
            container("exited", &[]),
        ];
        for f in &filters {
            let doubled = Filter::not(Filter::not(f.clone()));
            for c in &containers {
                assert_eq!(f.matches(c), doubled.matches(c), "filter {f:?}");
            }
        }
    }

    #[test]
    fn test_label_exists_ignores_value() {
        let c = container("running", &[("proxy", "")]);
        assert!(Filter::label_exists("proxy").matches(&c));
        assert!(!Filter::label_exists("other").matches(&c));
    }

    #[test]
    fn test_label_equals_is_exact_and_case_sensitive() {
        let c = container("running", &[("env", "Prod")]);
        assert!(Filter::label_equals("env", "Prod").matches(&c));
        assert!(!Filter::label_equals("env", "prod").matches(&c));
        assert!(!Filter::label_equals("env", "Pro*").matches(&c));
    }

    #[test]
    fn test_label_equals_empty_value_requires_presence() {
        let c = container("running", &[]);
        assert!(!Filter::label_equals("env", "").matches(&c));
    }

    #[test]
    fn test_state_equals_exact_match() {
        assert!(Filter::state_equals("running").matches(&container("running", &[])));
        assert!(!Filter::state_equals("Running").matches(&container("running", &[])));
    }

    #[test]
    fn test_filter_deserializes_from_json() {
        let json = r#"{"all":[{"label_equals":{"key":"proxy","value":"true"}},{"not":{"state_equals":"exited"}}]}"#;
        let f: Filter = serde_json::from_str(json).expect("valid filter json");
        assert_eq!(
            f,
            Filter::all([
                Filter::label_equals("proxy", "true"),
                Filter::not(Filter::state_equals("exited")),
            ])
        );
    }
}
