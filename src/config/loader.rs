//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ControlPlaneConfig;
use crate::config::validation::{validate_config, InvalidSetting};

/// Environment variable holding comma-separated registry addresses.
pub const ENV_REGISTRY_ADDRESS: &str = "REGISTRY_ADDRESS";
/// Environment variable naming this proxy instance.
pub const ENV_INSTANCE_NAME: &str = "PROXY_INSTANCE_NAME";
/// Environment variable selecting the discovery mode.
pub const ENV_MODE: &str = "MODE";
/// Environment variable naming the swarm listener.
pub const ENV_LISTENER_ADDRESS: &str = "LISTENER_ADDRESS";
/// Environment variable overriding the API bind address.
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<InvalidSetting>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse configuration from a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<ControlPlaneConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ControlPlaneConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables on top of `config`.
///
/// `lookup` is `std::env::var` in production; tests pass a closure.
pub fn apply_env_overrides<F>(config: &mut ControlPlaneConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addresses) = lookup(ENV_REGISTRY_ADDRESS) {
        config.registry.addresses = vec![addresses];
    }
    if let Some(name) = lookup(ENV_INSTANCE_NAME).filter(|v| !v.is_empty()) {
        config.discovery.instance_name = name;
    }
    if let Some(mode) = lookup(ENV_MODE) {
        config.discovery.mode = mode;
    }
    if let Some(listener) = lookup(ENV_LISTENER_ADDRESS) {
        config.discovery.listener_address = Some(listener).filter(|v| !v.is_empty());
    }
    if let Some(bind) = lookup(ENV_BIND_ADDRESS).filter(|v| !v.is_empty()) {
        config.server.bind_address = bind;
    }
}

/// Load the optional config file, apply process environment overrides and validate.
pub fn load(path: Option<&Path>) -> Result<ControlPlaneConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ControlPlaneConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ControlPlaneConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (ENV_REGISTRY_ADDRESS, "my-consul-1,my-consul-2"),
                (ENV_INSTANCE_NAME, "proxy-test-instance"),
                (ENV_MODE, "SWarM"),
                (ENV_LISTENER_ADDRESS, "swarm-listener"),
            ]),
        );

        assert_eq!(config.registry.addresses, ["my-consul-1,my-consul-2"]);
        assert_eq!(config.discovery.instance_name, "proxy-test-instance");
        assert_eq!(config.discovery.mode, "SWarM");
        assert_eq!(config.discovery.listener_address.as_deref(), Some("swarm-listener"));
    }

    #[test]
    fn test_unset_env_keeps_file_values() {
        let mut config = ControlPlaneConfig::default();
        config.registry.addresses = vec!["http://registry".into()];
        apply_env_overrides(&mut config, env(&[]));
        assert_eq!(config.registry.addresses, ["http://registry"]);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[proxy]\nconfig_path = \"/tmp/haproxy.cfg\"\n\n[discovery]\nmode = \"service\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.proxy.config_path, "/tmp/haproxy.cfg");
        assert_eq!(config.discovery.mode, "service");
    }

    #[test]
    fn test_load_config_rejects_bad_mode() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[discovery]\nmode = \"mesh\"").unwrap();

        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.field == "discovery.mode"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
