//! Process configuration, read once at startup and injected everywhere else.

use std::borrow::Cow;

pub const CTGOV_BASE: &str = "https://clinicaltrials.gov/api/v2";
pub const CTGOV_BASE_ENV: &str = "TRIALMATCH_CTGOV_BASE";

pub const OPENAI_BASE: &str = "https://api.openai.com/v1";
pub const OPENAI_BASE_ENV: &str = "TRIALMATCH_OPENAI_BASE";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL_ENV: &str = "TRIALMATCH_OPENAI_MODEL";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone)]
pub struct Config {
    pub ctgov_base: Cow<'static, str>,
    pub reasoning: ReasoningConfig,
}

#[derive(Clone)]
pub struct ReasoningConfig {
    /// `None` disables the reasoning service for the lifetime of the process.
    pub api_key: Option<String>,
    pub model: String,
    pub base: Cow<'static, str>,
}

impl std::fmt::Debug for ReasoningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base", &self.base)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ctgov_base: Cow::Borrowed(CTGOV_BASE),
            reasoning: ReasoningConfig::disabled(),
        }
    }
}

impl ReasoningConfig {
    pub fn disabled() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base: Cow::Borrowed(OPENAI_BASE),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            ctgov_base: non_blank(CTGOV_BASE_ENV)
                .map(Cow::Owned)
                .unwrap_or(Cow::Borrowed(CTGOV_BASE)),
            reasoning: ReasoningConfig {
                api_key: non_blank(OPENAI_API_KEY_ENV),
                model: non_blank(OPENAI_MODEL_ENV)
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base: non_blank(OPENAI_BASE_ENV)
                    .map(Cow::Owned)
                    .unwrap_or(Cow::Borrowed(OPENAI_BASE)),
            },
        }
    }
}
