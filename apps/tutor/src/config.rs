use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use client_core::{HttpTransferConfig, ProgressPlan, UploadPolicy};
use toml::{Table, Value};
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "tutor.toml";

/// Environment variables and the setting each one overrides. Later entries win.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("TUTOR_SERVER_URL", "server_url"),
    ("APP__SERVER_URL", "server_url"),
    ("APP__API_PREFIX", "api_prefix"),
    ("TUTOR_ACCESS_TOKEN", "access_token"),
    ("APP__ACCESS_TOKEN", "access_token"),
    ("APP__REQUEST_TIMEOUT_SECS", "request_timeout_secs"),
    ("APP__PROGRESS_INTERVAL_MS", "progress_interval_ms"),
    ("APP__MAX_UPLOAD_BYTES", "max_upload_bytes"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub api_prefix: String,
    pub access_token: Option<String>,
    /// `None` or `0` means requests never time out.
    pub request_timeout_secs: Option<u64>,
    pub progress_start: u8,
    pub progress_step: u8,
    pub progress_ceiling: u8,
    pub progress_interval_ms: u64,
    pub max_upload_bytes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let plan = ProgressPlan::default();
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            api_prefix: "/api".into(),
            access_token: None,
            request_timeout_secs: None,
            progress_start: plan.start,
            progress_step: plan.step,
            progress_ceiling: plan.ceiling,
            progress_interval_ms: plan.interval.as_millis() as u64,
            max_upload_bytes: UploadPolicy::default().max_bytes,
        }
    }
}

impl Settings {
    pub fn transfer_config(&self) -> HttpTransferConfig {
        HttpTransferConfig {
            server_url: self.server_url.clone(),
            api_prefix: self.api_prefix.clone(),
            request_timeout: self
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    pub fn progress_plan(&self) -> ProgressPlan {
        ProgressPlan {
            start: self.progress_start,
            step: self.progress_step,
            ceiling: self.progress_ceiling,
            interval: Duration::from_millis(self.progress_interval_ms),
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.max_upload_bytes,
            ..UploadPolicy::default()
        }
    }
}

/// Defaults, then `config_path` (or `tutor.toml` in the working directory),
/// then environment variables.
pub fn load_settings(config_path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(&path) {
        Ok(raw) => {
            if let Err(err) = apply_file_overrides(&mut settings, &raw) {
                warn!(path = %path.display(), error = %err, "config: ignoring unparsable file");
            }
        }
        Err(err) if config_path.is_some() => {
            warn!(path = %path.display(), error = %err, "config: could not read file");
        }
        Err(_) => debug!(path = %path.display(), "config: no file, using defaults"),
    }

    apply_env_overrides(&mut settings, |name| env::var(name).ok());
    settings
}

pub fn apply_file_overrides(settings: &mut Settings, raw: &str) -> Result<(), toml::de::Error> {
    let table = toml::from_str::<Table>(raw)?;
    for (key, value) in &table {
        let text = match value {
            Value::String(text) => text.clone(),
            Value::Integer(number) => number.to_string(),
            other => {
                warn!(key = %key, kind = other.type_str(), "config: unsupported value type");
                continue;
            }
        };
        apply_setting(settings, key, &text);
    }
    Ok(())
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for (name, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(name) {
            apply_setting(settings, key, &value);
        }
    }
}

fn apply_setting(settings: &mut Settings, key: &str, value: &str) {
    match key {
        "server_url" => settings.server_url = value.trim().to_string(),
        "api_prefix" => settings.api_prefix = value.trim().to_string(),
        "access_token" => {
            let token = value.trim();
            settings.access_token = (!token.is_empty()).then(|| token.to_string());
        }
        "request_timeout_secs" => {
            if let Some(secs) = parse_number(key, value) {
                settings.request_timeout_secs = Some(secs);
            }
        }
        "progress_start" => set_number(&mut settings.progress_start, key, value),
        "progress_step" => set_number(&mut settings.progress_step, key, value),
        "progress_ceiling" => set_number(&mut settings.progress_ceiling, key, value),
        "progress_interval_ms" => set_number(&mut settings.progress_interval_ms, key, value),
        "max_upload_bytes" => set_number(&mut settings.max_upload_bytes, key, value),
        _ => warn!(key, "config: unknown setting"),
    }
}

fn set_number<T: std::str::FromStr>(slot: &mut T, key: &str, value: &str) {
    if let Some(parsed) = parse_number(key, value) {
        *slot = parsed;
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        warn!(key, value, "config: expected a non-negative number");
    }
    parsed
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
