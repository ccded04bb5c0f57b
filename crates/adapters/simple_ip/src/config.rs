//! Simple IP protocol configuration.

use serde::Deserialize;

/// Configuration for the Simple IP control channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimpleIpConfig {
    /// TCP port used when the device address carries none.
    pub port: u16,
}

impl Default for SimpleIpConfig {
    fn default() -> Self {
        Self { port: 20060 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_port_20060() {
        assert_eq!(SimpleIpConfig::default().port, 20060);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let config: SimpleIpConfig = toml::from_str("port = 21000").unwrap();
        assert_eq!(config.port, 21000);
    }

    #[test]
    fn should_use_defaults_for_empty_table() {
        let config: SimpleIpConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 20060);
    }
}
