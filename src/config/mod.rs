//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: REGISTRY_ADDRESS, MODE, ...)
//!     → validation.rs (semantic checks)
//!     → ControlPlaneConfig (validated, immutable)
//!     → ReconfigureContext + subsystem constructors
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Environment wins over the file, matching container deployments
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load, load_config, ConfigError};
pub use schema::{
    CertConfig, ControlPlaneConfig, DiscoveryConfig, ObservabilityConfig, PropagationConfig,
    ProxyConfig, RegistryConfig, ServerConfig,
};
pub use validation::{validate_config, InvalidSetting};
