//! Model configuration.

use std::env;

use dynamap_model::types::ReturnValue;

/// Defaults applied to every model call unless the call overrides them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelConfig {
    /// Use strongly consistent reads for `get` and `query`.
    pub consistent_read: bool,
    /// `ReturnValues` for writes.
    pub return_values: Option<ReturnValue>,
}

impl ModelConfig {
    /// Create configuration from environment variables.
    ///
    /// Unrecognized `DYNAMAP_RETURN_VALUES` values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            consistent_read: env_bool("DYNAMAP_CONSISTENT_READ", false),
            return_values: env::var("DYNAMAP_RETURN_VALUES")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = ModelConfig::default();
        assert!(!config.consistent_read);
        assert_eq!(config.return_values, None);
    }

    #[test]
    fn test_should_fall_back_when_env_is_unset() {
        assert!(env_bool("DYNAMAP_TEST_UNSET_FLAG", true));
        assert!(!env_bool("DYNAMAP_TEST_UNSET_FLAG", false));
    }
}
