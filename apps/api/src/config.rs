use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_TEMPLATE_PATH: &str = "txt_files/template.txt";
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 30;

/// Which hosted model API the pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    /// Groq, via the OpenAI-style chat completions API.
    Groq,
    /// Anthropic, via the messages API.
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding this provider's credential.
    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Groq => "llama-3.3-70b-versatile",
            ProviderKind::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai",
            ProviderKind::Anthropic => "https://api.anthropic.com",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(ProviderKind::Groq),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => bail!("Unknown LLM provider '{other}' (expected 'groq' or 'anthropic')"),
        }
    }
}

/// Settings for the text generation call.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    /// `None` when the provider's key is not set. Generation requests are
    /// rejected in that case, the process still starts.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    /// Only sent to the chat completions API.
    pub temperature: f32,
    pub timeout: Duration,
}

/// Settings for the LaTeX-to-PDF step.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub program: String,
    /// Extra arguments placed before the standard ones, for wrapper programs.
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Whether the web service compiles by default. Requests may opt out.
    pub enabled: bool,
}

/// Application configuration loaded from environment variables.
/// Only malformed values fail startup; a missing credential does not.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub compiler: CompilerConfig,
    pub template_path: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("LLM_PROVIDER") {
            Some(raw) => raw.parse::<ProviderKind>().context("LLM_PROVIDER is invalid")?,
            None => ProviderKind::Groq,
        };

        let llm = LlmConfig {
            provider,
            api_key: var(provider.api_key_env()),
            model: var("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            base_url: var("LLM_BASE_URL")
                .unwrap_or_else(|| provider.default_base_url().to_string()),
            max_tokens: parse_or(var("LLM_MAX_TOKENS"), "LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            temperature: parse_or(
                var("LLM_TEMPERATURE"),
                "LLM_TEMPERATURE",
                DEFAULT_TEMPERATURE,
            )?,
            timeout: Duration::from_secs(parse_or(
                var("LLM_TIMEOUT_SECS"),
                "LLM_TIMEOUT_SECS",
                DEFAULT_LLM_TIMEOUT_SECS,
            )?),
        };

        let compiler = CompilerConfig {
            program: var("PDFLATEX_BIN").unwrap_or_else(|| "pdflatex".to_string()),
            args: var("PDFLATEX_ARGS")
                .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            timeout: Duration::from_secs(parse_or(
                var("COMPILE_TIMEOUT_SECS"),
                "COMPILE_TIMEOUT_SECS",
                DEFAULT_COMPILE_TIMEOUT_SECS,
            )?),
            enabled: match var("COMPILE_PDF") {
                Some(raw) => parse_bool(&raw).context("COMPILE_PDF must be true or false")?,
                None => true,
            },
        };

        Ok(Config {
            llm,
            compiler,
            template_path: var("TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_PATH)),
            port: parse_or(var("PORT"), "PORT", 5000)?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Re-targets the configuration at another provider. The key is re-read
    /// for it; `LLM_MODEL` and `LLM_BASE_URL` still win over its defaults.
    pub fn with_provider<F>(mut self, provider: ProviderKind, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if provider == self.llm.provider {
            return self;
        }
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        self.llm.provider = provider;
        self.llm.api_key = var(provider.api_key_env());
        self.llm.model = var("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string());
        self.llm.base_url =
            var("LLM_BASE_URL").unwrap_or_else(|| provider.default_base_url().to_string());
        self
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("'{other}' is not a boolean"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_target_groq() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.llm.provider, ProviderKind::Groq);
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm.max_tokens, 4000);
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.compiler.program, "pdflatex");
        assert!(config.compiler.args.is_empty());
        assert_eq!(config.compiler.timeout, Duration::from_secs(30));
        assert!(config.compiler.enabled);
        assert_eq!(config.template_path, PathBuf::from(DEFAULT_TEMPLATE_PATH));
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_anthropic_reads_its_own_key() {
        let config = Config::from_lookup(lookup(&[
            ("LLM_PROVIDER", "Anthropic"),
            ("GROQ_API_KEY", "gsk-1"),
            ("ANTHROPIC_API_KEY", "sk-ant-1"),
        ]))
        .unwrap();
        assert_eq!(config.llm.provider, ProviderKind::Anthropic);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-ant-1"));
        assert_eq!(config.llm.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = Config::from_lookup(lookup(&[("GROQ_API_KEY", "   ")])).unwrap();
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = Config::from_lookup(lookup(&[("LLM_PROVIDER", "openai")])).unwrap_err();
        assert!(format!("{err:#}").contains("LLM_PROVIDER"));
    }

    #[test]
    fn test_malformed_number_names_variable() {
        let err = Config::from_lookup(lookup(&[("LLM_MAX_TOKENS", "lots")])).unwrap_err();
        assert!(err.to_string().contains("LLM_MAX_TOKENS"));
    }

    #[test]
    fn test_compile_pdf_toggle() {
        let config = Config::from_lookup(lookup(&[("COMPILE_PDF", "off")])).unwrap();
        assert!(!config.compiler.enabled);
        assert!(Config::from_lookup(lookup(&[("COMPILE_PDF", "maybe")])).is_err());
    }

    #[test]
    fn test_with_provider_switches_key_and_defaults() {
        let env = lookup(&[("GROQ_API_KEY", "gsk-1"), ("ANTHROPIC_API_KEY", "sk-ant-1")]);
        let config = Config::from_lookup(&env)
            .unwrap()
            .with_provider(ProviderKind::Anthropic, &env);
        assert_eq!(config.llm.provider, ProviderKind::Anthropic);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-ant-1"));
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
        assert_eq!(config.llm.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_with_provider_keeps_explicit_model_and_base_url() {
        let env = lookup(&[
            ("ANTHROPIC_API_KEY", "sk-ant-1"),
            ("LLM_MODEL", "claude-3-5-haiku-latest"),
            ("LLM_BASE_URL", "http://127.0.0.1:8080"),
        ]);
        let config = Config::from_lookup(&env)
            .unwrap()
            .with_provider(ProviderKind::Anthropic, &env);
        assert_eq!(config.llm.model, "claude-3-5-haiku-latest");
        assert_eq!(config.llm.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_compiler_args_split_on_whitespace() {
        let config =
            Config::from_lookup(lookup(&[("PDFLATEX_ARGS", " -halt-on-error  -file-line-error ")]))
                .unwrap();
        assert_eq!(config.compiler.args, ["-halt-on-error", "-file-line-error"]);
    }
}
