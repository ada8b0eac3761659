use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthflowSettings {
    pub backend: BackendSettings,
    pub provider: ProviderSettings,
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the backend that redeems server auth codes
    pub base_url: String,
    /// Path of the verification endpoint, appended to `base_url`
    pub verify_path: String,
    /// Upper bound for one verification exchange
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub name: String,
    /// Whether the provider SDK runs natively. Off-platform, provider
    /// initialization and sign-out are skipped.
    pub native_platform: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub path: String,

    // Direct value (can be overridden by environment variable)
    pub encryption_key: Option<String>,

    // Environment variable name for override
    pub encryption_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            verify_path: "/auth/google".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: "google".to_string(),
            native_platform: true,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: ".authflow/session.json".to_string(),
            encryption_key: None,
            encryption_key_env: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AuthflowSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    /// - Logger initialization fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        // Load base settings from TOML or defaults
        let (mut settings, sources) = Self::load_base_settings()?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        settings.init_logging()?;
        for source in sources {
            log::info!("✓ Loaded settings from {source}");
        }

        Ok(settings)
    }

    /// Initialize `env_logger`, with `RUST_LOG` taking precedence over the configured level
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed
    pub fn init_logging(&self) -> Result<(), Box<dyn std::error::Error>> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.logging.level.as_str()),
        )
        .try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `AUTHFLOW_CONFIG_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<(Self, Vec<String>), Box<dyn std::error::Error>> {
        let mut settings = Self::default();
        let mut sources = Vec::new();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml_file(&default_config_path)?;
            sources.push(default_config_path.display().to_string());
        }

        if let Ok(config_dir) = std::env::var("AUTHFLOW_CONFIG_DIR") {
            let config_path = std::path::Path::new(&config_dir).join("Settings.toml");
            if config_path.exists() {
                // Replace settings with those from the config directory
                settings = Self::from_toml_file(&config_path)?;
                sources.push(config_path.display().to_string());
            }
        }

        Ok((settings, sources))
    }

    /// Parse a settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_backend_env_overrides(&mut settings.backend);
        Self::apply_provider_env_overrides(&mut settings.provider);
        Self::apply_store_env_overrides(&mut settings.store);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_backend_env_overrides(backend_settings: &mut BackendSettings) {
        if let Ok(base_url) = std::env::var("BACKEND_URL") {
            backend_settings.base_url = base_url;
        }
        if let Ok(verify_path) = std::env::var("BACKEND_VERIFY_PATH") {
            backend_settings.verify_path = verify_path;
        }
        if let Ok(timeout_str) = std::env::var("BACKEND_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                backend_settings.timeout_seconds = timeout;
            }
        }
    }

    fn apply_provider_env_overrides(provider_settings: &mut ProviderSettings) {
        if let Ok(native_str) = std::env::var("PROVIDER_NATIVE_PLATFORM") {
            if let Ok(native) = native_str.parse::<bool>() {
                provider_settings.native_platform = native;
            }
        }
    }

    fn apply_store_env_overrides(store_settings: &mut StoreSettings) {
        if let Ok(path) = std::env::var("SESSION_STORE_PATH") {
            store_settings.path = path;
        }
        if let Ok(key) = std::env::var("SESSION_STORE_KEY") {
            if !key.is_empty() {
                store_settings.encryption_key = Some(key);
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file; variables already set win
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    if std::env::var_os(key.trim()).is_none() {
                        std::env::set_var(key.trim(), value.trim());
                    }
                }
            }
        }
    }
}

impl StoreSettings {
    /// Get the encryption key, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_encryption_key(&self) -> Option<String> {
        if let Some(env_var) = &self.encryption_key_env {
            if let Ok(value) = std::env::var(env_var) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        self.encryption_key.clone().filter(|key| !key.is_empty())
    }
}
