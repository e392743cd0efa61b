use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str = concat!("wikibridge/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 50_000;
pub const DEFAULT_LOCALE: &str = "en";

pub const ENV_API_URL: &str = "WIKIJS_API_URL";
pub const ENV_API_TOKEN: &str = "WIKIJS_API_TOKEN";
pub const ENV_TIMEOUT_MS: &str = "WIKIJS_HTTP_TIMEOUT_MS";
pub const ENV_USER_AGENT: &str = "WIKIJS_USER_AGENT";
pub const ENV_MAX_CONTENT_CHARS: &str = "WIKIJS_MAX_CONTENT_CHARS";
pub const ENV_DEFAULT_LOCALE: &str = "WIKIJS_DEFAULT_LOCALE";

/// On-disk configuration; every key is optional and env values win.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub wiki: WikiSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiSection {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ToolsSection {
    pub max_content_chars: Option<usize>,
    pub default_locale: Option<String>,
}

/// Load a FileConfig from TOML. Returns default if the file doesn't exist.
pub fn load_file_config(config_path: &Path) -> Result<FileConfig> {
    if !config_path.exists() {
        return Ok(FileConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: FileConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// Connection settings for the GraphQL gateway, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_url: String,
    pub api_token: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

/// Knobs the dispatchers read on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub max_content_chars: usize,
    pub default_locale: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub gateway: GatewayConfig,
    pub tools: ToolSettings,
}

impl BridgeConfig {
    /// Resolve from the process environment layered over `file`.
    pub fn from_env(file: &FileConfig) -> Result<Self> {
        Self::resolve(file, |key| env::var(key).ok())
    }

    /// Resolve each setting as env > file > default. URL and token are mandatory.
    pub fn resolve<F>(file: &FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_url = env_value(ENV_API_URL).or_else(|| non_blank(file.wiki.api_url.as_deref()));
        let api_token =
            env_value(ENV_API_TOKEN).or_else(|| non_blank(file.wiki.api_token.as_deref()));

        let mut missing = Vec::new();
        if api_url.is_none() {
            missing.push(ENV_API_URL);
        }
        if api_token.is_none() {
            missing.push(ENV_API_TOKEN);
        }
        let (Some(api_url), Some(api_token)) = (api_url, api_token) else {
            bail!(
                "missing required wiki settings: {} (set them in the environment or .env)",
                missing.join(", ")
            );
        };

        let timeout_ms = env_value(ENV_TIMEOUT_MS)
            .and_then(|value| value.parse::<u64>().ok())
            .or(file.wiki.timeout_ms)
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let user_agent = env_value(ENV_USER_AGENT)
            .or_else(|| non_blank(file.wiki.user_agent.as_deref()))
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let max_content_chars = env_value(ENV_MAX_CONTENT_CHARS)
            .and_then(|value| value.parse::<usize>().ok())
            .or(file.tools.max_content_chars)
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_CONTENT_CHARS);
        let default_locale = env_value(ENV_DEFAULT_LOCALE)
            .or_else(|| non_blank(file.tools.default_locale.as_deref()))
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        Ok(Self {
            gateway: GatewayConfig {
                api_url,
                api_token,
                timeout_ms,
                user_agent,
            },
            tools: ToolSettings {
                max_content_chars,
                default_locale,
            },
        })
    }

    /// Human-readable dump with the credential masked.
    pub fn diagnostics(&self) -> String {
        format!(
            "api_url={}\napi_token={}\ntimeout_ms={}\nuser_agent={}\n\
             max_content_chars={}\ndefault_locale={}",
            self.gateway.api_url,
            redact(&self.gateway.api_token),
            self.gateway.timeout_ms,
            self.gateway.user_agent,
            self.tools.max_content_chars,
            self.tools.default_locale,
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

fn redact(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
