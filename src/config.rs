use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_LLM_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "x-ai/grok-4.1-fast:free";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAIL_FROM: &str = "triage@localhost";

const CONFIG_FILE_NAME: &str = "config.json";
const DATA_FILE_NAME: &str = "triage-data.json";
const CACHE_FILE_NAME: &str = "analysis_cache.json";

/// Values persisted by `triage config init`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    pub llm_api_key: Option<String>,
    pub llm_api_url: Option<String>,
    pub llm_model: Option<String>,
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: Option<String>,
    pub data_file: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Some(dir) = non_empty_var("TRIAGE_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = non_empty_var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(dir).join("triage"));
    }
    non_empty_var("HOME")
        .map(|home| PathBuf::from(home).join(".config").join("triage"))
        .ok_or_else(|| AppError::Configuration("cannot locate a config directory".to_string()))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmSettings,
    pub mail: MailSettings,
    pub data_file: PathBuf,
    pub cache_file: PathBuf,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let dir = config_directory()?;
        let stored = StoredConfig::load_from(&dir.join(CONFIG_FILE_NAME))?;
        Ok(Self::resolve(stored, &dir, non_empty_var))
    }

    /// Layers environment overrides on top of the stored file.
    pub fn resolve<F>(stored: StoredConfig, dir: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, stored: Option<String>| lookup(key).or(stored);

        let data_file = pick("TRIAGE_DATA_FILE", stored.data_file)
            .map(PathBuf::from)
            .unwrap_or_else(|| dir.join(DATA_FILE_NAME));

        Self {
            llm: LlmSettings {
                api_key: pick("TRIAGE_LLM_API_KEY", stored.llm_api_key),
                api_url: pick("TRIAGE_LLM_API_URL", stored.llm_api_url)
                    .unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
                model: pick("TRIAGE_LLM_MODEL", stored.llm_model)
                    .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                max_tokens: DEFAULT_MAX_TOKENS,
                temperature: DEFAULT_TEMPERATURE,
            },
            mail: MailSettings {
                api_url: pick("TRIAGE_MAIL_API_URL", stored.mail_api_url),
                api_key: pick("TRIAGE_MAIL_API_KEY", stored.mail_api_key),
                from: pick("TRIAGE_MAIL_FROM", stored.mail_from)
                    .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            },
            data_file,
            cache_file: dir.join(CACHE_FILE_NAME),
        }
    }

    /// Problems worth reporting at startup. None of them stop a run.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.llm.api_key.is_none() {
            warnings.push("LLM API key not configured; ticket analysis will fall back to defaults.");
        }
        if self.mail.api_url.is_none() {
            warnings.push("mail API URL not configured; assignment emails will not be sent.");
        }
        warnings
    }
}
