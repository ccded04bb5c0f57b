//! REST protocol configuration.

use serde::Deserialize;

/// Where the JSON-RPC control endpoint lives on each device.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// HTTP port used when the device address carries none.
    pub port: u16,
    /// Path of the system service endpoint.
    pub path: String,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            port: 80,
            path: "/sony/system".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = RestConfig::default();
        assert_eq!(config.port, 80);
        assert_eq!(config.path, "/sony/system");
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            port = 8080
            path = "/api/system"
        "#;
        let config: RestConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.path, "/api/system");
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: RestConfig = toml::from_str("port = 8000").unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.path, "/sony/system");
    }
}
