use serde::{Deserialize, Serialize};
use std::fs;

/// Process-wide configuration, loaded once at startup.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GateConfig {
    /// When set, no credential is ever accepted; every attempt is logged.
    #[serde(default)]
    pub login_disabled: bool,
    /// Extra usernames appended to the stock blacklist.
    #[serde(default)]
    pub extra_banned_names: Vec<String>,
    /// Administrative dispatch tags exempt from the unknown-action rule.
    #[serde(default = "default_allowed_actions")]
    pub allowed_actions: Vec<String>,
    /// Directory names whose paths robots may not enter.
    #[serde(default = "default_internal_dirs")]
    pub internal_dirs: Vec<String>,
    /// Path fragment for missing media files (excepted from robot 403).
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
    /// Path fragment for stale cache items (excepted from robot 403).
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Script suffix that overrides the media/cache exception.
    #[serde(default = "default_script_suffix")]
    pub script_suffix: String,
    /// Entry-point marker appended to every log record.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
}

fn default_allowed_actions() -> Vec<String> {
    vec!["wp_ajax_nopriv_wp-remove-post-lock".to_string()]
}

fn default_internal_dirs() -> Vec<String> {
    vec![
        "wp-admin".to_string(),
        "wp-includes".to_string(),
        "wp-content".to_string(),
    ]
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

fn default_cache_dir() -> String {
    "wp-content/cache".to_string()
}

fn default_script_suffix() -> String {
    ".php".to_string()
}

fn default_entry_point() -> String {
    "index.php".to_string()
}

impl GateConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: GateConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            login_disabled: false,
            extra_banned_names: Vec::new(),
            allowed_actions: default_allowed_actions(),
            internal_dirs: default_internal_dirs(),
            uploads_dir: default_uploads_dir(),
            cache_dir: default_cache_dir(),
            script_suffix: default_script_suffix(),
            entry_point: default_entry_point(),
        }
    }
}
