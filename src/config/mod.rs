use crate::models::EngineSettings;
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};

/// Name of the optional settings file inside the configuration directory
pub const SETTINGS_FILE: &str = "autoclick.yaml";

/// Prefix of environment variables that override the settings file
pub const ENV_PREFIX: &str = "AUTOCLICK";

/// Loads [`EngineSettings`] from layered sources.
///
/// Sources, lowest precedence first:
/// 1. Built-in defaults
/// 2. `autoclick.yaml` in the configuration directory (optional)
/// 3. `AUTOCLICK_*` environment variables, e.g. `AUTOCLICK_DOUBLE_CLICK_GAP_MS=80`
///
/// The loader only reads. Nothing the user types into the form is written back.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    env_override: Option<config::Map<String, String>>,
}

impl SettingsLoader {
    /// Create a loader for the given configuration directory.
    ///
    /// The directory does not have to exist; a missing file means defaults.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            config_dir,
            env_override: None,
        }
    }

    /// Read environment overrides from `vars` instead of the process environment.
    pub fn with_environment(mut self, vars: config::Map<String, String>) -> Self {
        self.env_override = Some(vars);
        self
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    /// Load and validate the effective settings.
    pub fn load(&self) -> Result<EngineSettings> {
        if self.settings_path.exists() {
            tracing::info!("Loading settings from {}", self.settings_path);
        } else {
            tracing::debug!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(self.env_override.clone());

        let settings: EngineSettings = Config::builder()
            .add_source(
                File::new(self.settings_path.as_str(), FileFormat::Yaml).required(false),
            )
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Render settings as YAML in the same shape the settings file uses.
    pub fn render_yaml(settings: &EngineSettings) -> Result<String> {
        serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")
    }

    fn validate(settings: &EngineSettings) -> Result<()> {
        if settings.event_buffer == 0 {
            bail!("event_buffer must be at least 1");
        }
        if settings.log_dir.trim().is_empty() {
            bail!("log_dir must not be empty");
        }
        Ok(())
    }
}
