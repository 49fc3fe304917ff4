use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_TABLE: &str = "Membres ZAP";
pub const DEFAULT_VIEW: &str = "Membres cotisants";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

pub const ENV_API_KEY: &str = "AIRTABLE_API_KEY";
pub const ENV_BASE_ID: &str = "AIRTABLE_BASE_ID";

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub port: Option<u16>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub table: Option<String>,
    pub view: Option<String>,
    pub timeout: Option<u64>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".zapdir").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

/// Everything the record source needs, resolved once at startup and passed
/// down explicitly. Credentials never come from argv.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub api_url: String,
    pub api_key: String,
    pub base_id: String,
    pub table: String,
    pub view: String,
    pub timeout_seconds: u64,
}

#[derive(Clone, Debug, Default)]
pub struct SourceSettings {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub table: Option<String>,
    pub view: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Merges settings with the environment (environment wins for credentials)
/// and fails when either credential is absent. Startup aborts on `Err`.
pub fn resolve_source_config(settings: SourceSettings) -> Result<SourceConfig, String> {
    resolve_source_config_with(settings, |name| env::var(name).ok())
}

fn resolve_source_config_with(
    settings: SourceSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SourceConfig, String> {
    let api_key = lookup(ENV_API_KEY)
        .filter(|v| !v.trim().is_empty())
        .or(settings.api_key)
        .ok_or_else(|| format!("missing API key: set {ENV_API_KEY} or api_key in the config"))?;
    let base_id = lookup(ENV_BASE_ID)
        .filter(|v| !v.trim().is_empty())
        .or(settings.base_id)
        .ok_or_else(|| format!("missing base id: set {ENV_BASE_ID} or base_id in the config"))?;

    Ok(SourceConfig {
        api_url: settings
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        api_key,
        base_id,
        table: settings.table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        view: settings.view.unwrap_or_else(|| DEFAULT_VIEW.to_string()),
        timeout_seconds: settings.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
    })
}
