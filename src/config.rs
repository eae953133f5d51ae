use std::path::{Path, PathBuf};
use colored::Colorize;
use json_comments::StripComments;
use serde::{Serialize, Deserialize};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/generate";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub endpoint: String,
    pub request_timeout_secs: Option<u64>, // None waits forever
    pub user_label: String,
    pub assistant_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: None,
            user_label: "You".to_string(),
            assistant_label: "AI".to_string(),
        }
    }
}

impl Config {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(StripComments::new(json.as_bytes()))
    }

    /// Applies `PARLEY_*` overrides; `lookup` is `std::env::var` outside of tests.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(debug) = lookup("PARLEY_DEBUG") { self.debug = debug.to_lowercase() == "true"; }
        if let Some(endpoint) = lookup("PARLEY_ENDPOINT") { self.endpoint = endpoint.trim().to_string(); }
        if let Some(secs) = lookup("PARLEY_REQUEST_TIMEOUT_SECS") {
            if let Ok(n) = secs.trim().parse::<u64>() {
                self.request_timeout_secs = if n == 0 { None } else { Some(n) };
            }
        }
        if let Some(label) = lookup("PARLEY_USER_LABEL") { self.user_label = label; }
        if let Some(label) = lookup("PARLEY_ASSISTANT_LABEL") { self.assistant_label = label; }
    }
}

pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("PARLEY_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    let mut config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config_dir.push("parley");
    config_dir.push("parley.config.json");
    config_dir
}

fn write_default_config(config_path: &Path, config: &Config) {
    let Some(parent) = config_path.parent() else { return };
    if let Err(e) = std::fs::create_dir_all(parent) {
        println!(
            "{}",
            format!("Failed to create config directory '{}': {}", parent.display(), e).red()
        );
        return;
    }
    let default_json = serde_json::to_string_pretty(config).unwrap_or_else(|_| "{}".to_string());
    if let Err(e) = std::fs::write(config_path, default_json) {
        println!(
            "{}",
            format!("Failed to write default config to '{}': {}", config_path.display(), e).red()
        );
    } else {
        println!(
            "{}",
            format!("Created default config at '{}'", config_path.display()).green()
        );
    }
}

pub fn load_config_from(config_path: &Path) -> Config {
    let mut config = Config::default();

    if !config_path.exists() {
        write_default_config(config_path, &config);
    }

    if let Ok(json) = std::fs::read_to_string(config_path) {
        match Config::parse(&json) {
            Ok(file_config) => config = file_config,
            Err(e) => println!(
                "{} {} {}\n{}",
                "Failed to parse".red(),
                config_path.display().to_string().red(),
                format!(": {}", e).red(),
                "Using default config"
            ),
        }
    }

    config
}

pub fn load_config() -> Config {
    let mut config = load_config_from(&get_config_path());
    config.apply_overrides(|key| std::env::var(key).ok());
    config
}
