use std::env;
use std::fs;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::warn;

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["https://aielevate.xyz", "https://www.aielevate.xyz"];
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 700;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_JSON_LIMIT: usize = 1024 * 1024;
pub const DEFAULT_APP_KEY_HEADER: &str = "X-APP-KEY";
pub const DEFAULT_FALLBACK_REPLY: &str = "I could not form a reply.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are the **AI PM Agent**. Be concise and actionable. \
Provide steps, checklists, KPIs, risks, and examples (Jira, SAP, SLAs, OKRs, RACI).\n\
Do not reveal chain-of-thought; answer directly with brief rationale when useful.";

pub const DEFAULT_ORG_CONTEXT: &str = "Org: AVL/TriFin (NL, Europe/Amsterdam). Domain: SAP/Jira PM.";

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub json_limit: usize,
}

/// Cross-origin settings. Wildcard mode must be switched on explicitly.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_any_origin: bool,
    pub app_key_header: String,
}

/// Everything needed to reach the completion API.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Text injected ahead of every conversation, plus the reply used when
/// the upstream answer carries no text.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub system_prompt: String,
    pub org_context: String,
    pub fallback_reply: String,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub upstream: UpstreamConfig,
    pub prompts: PromptConfig,
    pub debug: bool,
}

impl RelayConfig {
    /// Reads configuration from the process environment.
    ///
    /// | Variable                 | Default                                        |
    /// |--------------------------|------------------------------------------------|
    /// | `HOST`                   | `0.0.0.0`                                      |
    /// | `PORT`                   | `3000`                                         |
    /// | `ALLOWED_ORIGINS`        | `https://aielevate.xyz,https://www.aielevate.xyz` |
    /// | `CORS_ALLOW_ANY_ORIGIN`  | `false`                                        |
    /// | `APP_KEY_HEADER`         | `X-APP-KEY`                                    |
    /// | `OPENAI_API_KEY`         | unset                                          |
    /// | `UPSTREAM_URL`           | OpenAI chat completions                        |
    /// | `LLM_MODEL`              | `gpt-4o-mini`                                  |
    /// | `LLM_TEMPERATURE`        | `0.3`                                          |
    /// | `LLM_MAX_TOKENS`         | `700`                                          |
    /// | `UPSTREAM_TIMEOUT_SECS`  | `60`                                           |
    /// | `SYSTEM_PROMPT[_FILE]`   | built-in persona                               |
    /// | `ORG_CONTEXT[_FILE]`     | built-in org context                           |
    /// | `FALLBACK_REPLY`         | `I could not form a reply.`                    |
    /// | `JSON_LIMIT_BYTES`       | `1048576`                                      |
    /// | `DEBUG`                  | `false`                                        |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(v) => v.parse::<u16>().with_context(|| format!("PORT must be a port number, got {:?}", v))?,
            None => 3000,
        };
        let json_limit = parse_or(get("JSON_LIMIT_BYTES"), "JSON_LIMIT_BYTES", DEFAULT_JSON_LIMIT)?;
        if json_limit == 0 {
            bail!("JSON_LIMIT_BYTES must be greater than zero");
        }

        let allow_any_origin = parse_flag(get("CORS_ALLOW_ANY_ORIGIN"), "CORS_ALLOW_ANY_ORIGIN")?;
        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => parse_origins(&list, allow_any_origin),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let temperature = parse_or(get("LLM_TEMPERATURE"), "LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
            bail!("LLM_TEMPERATURE must be between 0 and 2, got {}", temperature);
        }
        let max_tokens = parse_or(get("LLM_MAX_TOKENS"), "LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?;
        if max_tokens == 0 {
            bail!("LLM_MAX_TOKENS must be greater than zero");
        }
        let timeout_secs = parse_or(get("UPSTREAM_TIMEOUT_SECS"), "UPSTREAM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            bail!("UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }

        let system_prompt = text_or_file(get("SYSTEM_PROMPT"), get("SYSTEM_PROMPT_FILE"), "SYSTEM_PROMPT_FILE")?
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let org_context = text_or_file(get("ORG_CONTEXT"), get("ORG_CONTEXT_FILE"), "ORG_CONTEXT_FILE")?
            .unwrap_or_else(|| DEFAULT_ORG_CONTEXT.to_string());

        Ok(Self {
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                json_limit,
            },
            cors: CorsConfig {
                allowed_origins,
                allow_any_origin,
                app_key_header: get("APP_KEY_HEADER").unwrap_or_else(|| DEFAULT_APP_KEY_HEADER.to_string()),
            },
            upstream: UpstreamConfig {
                url: get("UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
                api_key: get("OPENAI_API_KEY"),
                model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature,
                max_tokens,
                timeout: Duration::from_secs(timeout_secs),
            },
            prompts: PromptConfig {
                system_prompt,
                org_context,
                fallback_reply: get("FALLBACK_REPLY").unwrap_or_else(|| DEFAULT_FALLBACK_REPLY.to_string()),
            },
            debug: parse_flag(get("DEBUG"), "DEBUG")?,
        })
    }
}

/// Default log filter for `env_logger`, chosen before the full config is read
/// so configuration warnings are not lost. `RUST_LOG` still wins.
pub fn log_filter_from_env() -> &'static str {
    match parse_flag(env::var("DEBUG").ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()), "DEBUG") {
        Ok(true) => "debug",
        _ => "info",
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.parse::<T>().with_context(|| format!("invalid value for {}: {:?}", key, v)),
        None => Ok(default),
    }
}

fn parse_flag(value: Option<String>, key: &str) -> Result<bool> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => bail!("{} must be a boolean flag, got {:?}", key, other),
    }
}

fn parse_origins(list: &str, allow_any_origin: bool) -> Vec<String> {
    list.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .filter(|origin| {
            if *origin == "*" && !allow_any_origin {
                warn!("Ignoring '*' in ALLOWED_ORIGINS; set CORS_ALLOW_ANY_ORIGIN=true to allow every origin");
                return false;
            }
            *origin != "*"
        })
        .map(str::to_string)
        .collect()
}

// A file path wins over inline text so long prompts can live outside the env.
fn text_or_file(inline: Option<String>, path: Option<String>, key: &str) -> Result<Option<String>> {
    if let Some(path) = path {
        let text = fs::read_to_string(&path).with_context(|| format!("failed to read {} at {}", key, path))?;
        return Ok(Some(text.trim().to_string()));
    }
    Ok(inline)
}
