//! Tool settings, read from a TOML file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_astra_conf")]
    pub astra_conf: PathBuf,

    #[serde(default = "default_bouquet_dir")]
    pub bouquet_dir: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_satellites_xml")]
    pub satellites_xml: PathBuf,

    #[serde(default = "default_astra_binary")]
    pub astra_binary: PathBuf,

    /// How long `astra --analyze` is left running
    #[serde(default = "default_analyze_seconds")]
    pub analyze_seconds: u64,

    /// Empty disables the reload notification
    #[serde(default = "default_reload_url")]
    pub reload_url: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_pass_through_marker")]
    pub pass_through_marker: String,

    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// Which service field the radio keywords are tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifyBy {
    #[default]
    Name,
    Provider,
    Either,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_id_pattern")]
    pub id_pattern: String,

    #[serde(default = "default_name_pattern")]
    pub name_pattern: String,

    #[serde(default = "default_provider_pattern")]
    pub provider_pattern: String,

    #[serde(default = "default_radio_keywords")]
    pub radio_keywords: Vec<String>,

    #[serde(default)]
    pub classify_by: ClassifyBy,
}

fn default_astra_conf() -> PathBuf {
    PathBuf::from("/etc/astra/astra.conf")
}

fn default_bouquet_dir() -> PathBuf {
    PathBuf::from("/etc/enigma2")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/tmp/CiefpSatelliteAnalyzer")
}

fn default_satellites_xml() -> PathBuf {
    PathBuf::from("/etc/tuxbox/satellites.xml")
}

fn default_astra_binary() -> PathBuf {
    PathBuf::from("/usr/bin/astra")
}

fn default_analyze_seconds() -> u64 {
    15
}

fn default_reload_url() -> String {
    "http://127.0.0.1/web/servicelistreload?mode=0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pass_through_marker() -> String {
    DEFAULT_PASS_THROUGH_MARKER.to_string()
}

fn default_id_pattern() -> String {
    DEFAULT_ID_PATTERN.to_string()
}

fn default_name_pattern() -> String {
    DEFAULT_NAME_PATTERN.to_string()
}

fn default_provider_pattern() -> String {
    DEFAULT_PROVIDER_PATTERN.to_string()
}

fn default_radio_keywords() -> Vec<String> {
    DEFAULT_RADIO_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            id_pattern: default_id_pattern(),
            name_pattern: default_name_pattern(),
            provider_pattern: default_provider_pattern(),
            radio_keywords: default_radio_keywords(),
            classify_by: ClassifyBy::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            astra_conf: default_astra_conf(),
            bouquet_dir: default_bouquet_dir(),
            log_dir: default_log_dir(),
            satellites_xml: default_satellites_xml(),
            astra_binary: default_astra_binary(),
            analyze_seconds: default_analyze_seconds(),
            reload_url: default_reload_url(),
            log_level: default_log_level(),
            pass_through_marker: default_pass_through_marker(),
            analysis: AnalysisSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads the settings file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Settings file {:?} not found, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(Error::io(path, e)),
        }
    }
}
