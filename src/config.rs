//! Runtime configuration
//!
//! Read once at startup and handed to the engine. Nothing below the binaries
//! looks at the process environment again.

use crate::error::{OptimizerError, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    OpenAi,
}

impl FromStr for LlmProvider {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "openai" => Ok(LlmProvider::OpenAi),
            other => Err(OptimizerError::Config(format!(
                "unknown LLM_PROVIDER '{}', expected 'gemini' or 'openai'",
                other
            ))),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

// Keep the key out of logs.
impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub llm: LlmSettings,
    pub host: String,
    pub port: u16,
    /// Forces the heuristic path even when a key is present.
    pub heuristic_only: bool,
}

impl OptimizerConfig {
    /// Heuristic-only configuration with default server address.
    pub fn heuristic() -> Self {
        Self {
            llm: LlmSettings {
                provider: LlmProvider::Gemini,
                api_key: None,
                model: DEFAULT_GEMINI_MODEL.to_string(),
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            },
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            heuristic_only: true,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds a config from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = match get("LLM_PROVIDER") {
            Some(p) => p.parse()?,
            None => LlmProvider::Gemini,
        };

        let llm = match provider {
            LlmProvider::Gemini => LlmSettings {
                provider,
                api_key: get("GEMINI_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            },
            LlmProvider::OpenAi => LlmSettings {
                provider,
                api_key: get("OPENAI_API_KEY"),
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
        };

        let port = match get("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| OptimizerError::Config(format!("PORT must be a port number, got '{}'", p)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            llm,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            heuristic_only: false,
        })
    }

    pub fn with_heuristic_only(mut self, heuristic_only: bool) -> Self {
        self.heuristic_only = self.heuristic_only || heuristic_only;
        self
    }

    /// True iff the AI path should be attempted.
    pub fn ai_enabled(&self) -> bool {
        !self.heuristic_only && self.llm.api_key.is_some()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
