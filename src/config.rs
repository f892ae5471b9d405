//! View configuration.
//!
//! Read once when a [`Runtime`](crate::pipeline::Runtime) is created and
//! shared by every view through the [`ViewContext`](crate::view::ViewContext).

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Environment variable consulted by [`ViewConfig::from_env`].
pub const UPDATE_POLICY_ENV: &str = "SPARK_VIEWS_UPDATE_POLICY";

/// How an element schedules update passes when its children change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePolicy {
    /// At most one pass in flight per element. Changes arriving while a pass
    /// runs collapse into a single follow-up pass.
    #[default]
    Serialized,
    /// Every change spawns its own pass. Passes may interleave; the last one
    /// to resume decides the final order. A pass that resumes after a newer
    /// one dropped a model disposes the view it built for it.
    Concurrent,
}

impl FromStr for UpdatePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serialized" | "serial" => Ok(UpdatePolicy::Serialized),
            "concurrent" => Ok(UpdatePolicy::Concurrent),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Unrecognized [`UpdatePolicy`] name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown update policy `{0}`")]
pub struct ParsePolicyError(pub String);

/// Settings shared by all views of a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewConfig {
    pub update_policy: UpdatePolicy,
}

impl ViewConfig {
    pub fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = policy;
        self
    }

    /// Defaults, overridden by `SPARK_VIEWS_UPDATE_POLICY` when set.
    ///
    /// An unparsable value is logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var(UPDATE_POLICY_ENV) {
            match raw.parse() {
                Ok(policy) => config.update_policy = policy,
                Err(err) => tracing::warn!(%err, "ignoring {UPDATE_POLICY_ENV}"),
            }
        }
        config
    }
}
