// Configuration module
// Public interface for configuration loading

mod loader;
mod settings;

pub use loader::{apply_env_overrides, config_path, load_config, load_config_from, BASE_URL_ENV};
pub use settings::{ClientConfig, Config, DEFAULT_BASE_URL};
