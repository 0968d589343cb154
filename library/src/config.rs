use directories::ProjectDirs;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::editor::ScaleLimits;
use crate::error::LibraryError;

const CONFIG_FILE: &str = "properties.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LocaleSettings {
    pub decimal_separator: char,
    pub group_separator: Option<char>,
    pub true_label: String,
    pub false_label: String,
    /// Source string -> translated string.
    pub translations: HashMap<String, String>,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            group_separator: Some(','),
            true_label: "True".to_string(),
            false_label: "False".to_string(),
            translations: HashMap::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    pub selection_debounce_ms: u64,
    pub waveform_debounce_ms: u64,
    pub max_scale_multiple: f64,
    pub svg_max_scale_multiple: f64,
    pub locale: LocaleSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            selection_debounce_ms: 100,
            waveform_debounce_ms: 250,
            max_scale_multiple: 50.0,
            svg_max_scale_multiple: 15.0,
            locale: LocaleSettings::default(),
        }
    }
}

impl EditorSettings {
    pub fn from_toml(toml_str: &str) -> Result<Self, LibraryError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn to_toml(&self) -> Result<String, LibraryError> {
        toml::to_string_pretty(self)
            .map_err(|e| LibraryError::InvalidArgument(format!("Failed to serialize settings: {}", e)))
    }

    pub fn selection_debounce(&self) -> Duration {
        Duration::from_millis(self.selection_debounce_ms)
    }

    pub fn waveform_debounce(&self) -> Duration {
        Duration::from_millis(self.waveform_debounce_ms)
    }

    pub fn scale_limits(&self) -> ScaleLimits {
        ScaleLimits {
            max_multiple: self.max_scale_multiple,
            svg_max_multiple: self.svg_max_scale_multiple,
        }
    }

    /// Reads settings from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(toml_str) => match Self::from_toml(&toml_str) {
                Ok(settings) => return settings,
                Err(e) => warn!("Failed to parse settings file, using defaults: {}", e),
            },
            Err(e) => warn!("Failed to read settings file, using defaults: {}", e),
        }
        Self::default()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), LibraryError> {
        fs::write(path, self.to_toml()?)?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }
}

fn get_config_path() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("org", "keyframes", "properties_core")?;
    let config_dir = proj_dirs.config_dir();
    if !config_dir.exists() {
        if let Err(e) = fs::create_dir_all(config_dir) {
            error!("Failed to create config directory: {}", e);
            return None;
        }
    }
    Some(config_dir.join(CONFIG_FILE))
}

/// Loads the user's settings from the platform config directory. A default
/// file is written on first run.
pub fn load_settings() -> EditorSettings {
    let Some(path) = get_config_path() else {
        return EditorSettings::default();
    };
    if path.exists() {
        return EditorSettings::load_from(&path);
    }
    let settings = EditorSettings::default();
    if let Err(e) = settings.save_to(&path) {
        error!("Failed to write settings file: {}", e);
    }
    settings
}
