//! Command-line and environment configuration.
//!
//! Flags fall back to environment variables, so a deployment can set the
//! provider credentials once and run `pagesmith` with no arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::RangedU64ValueParser;

use crate::agents::{AgentRoster, RosterError};
use crate::driver::DriverLimits;
use crate::llm::{ApiFlavor, ProviderConfig};
use crate::publish;
use crate::studio::StudioConfig;

pub const DEFAULT_PROMPT: &str = "Create a simple landing page for a new SaaS product called 'AI-Boost'. \
It needs a title, a brief description, and a call-to-action button that says 'Sign Up Now'. \
All code should be in a single `index.html` file.";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
}

#[derive(Debug, Parser)]
#[command(name = "pagesmith", about = "Agents draft a web page; you approve; a script publishes it")]
pub struct Cli {
    /// What the agents should build
    #[arg(long, env = "PAGESMITH_PROMPT", default_value = DEFAULT_PROMPT)]
    pub prompt: String,

    /// File the extracted HTML is written to
    #[arg(long, default_value = "index.html")]
    pub output: PathBuf,

    /// Script invoked with the commit message after a successful write
    #[arg(long, default_value = publish::DEFAULT_SCRIPT)]
    pub publish_script: PathBuf,

    /// Agent replies allowed before giving up
    #[arg(long, default_value_t = 30, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_turns: usize,

    /// Seconds to wait for a single completion
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub turn_timeout_secs: u64,

    /// Seconds to wait for the publish script
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub publish_timeout_secs: u64,

    /// TOML file defining the agents (defaults to the built-in trio)
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Don't reprint the conversation before asking for approval
    #[arg(long)]
    pub skip_review: bool,

    /// Completion API
    #[arg(long, value_enum, env = "PAGESMITH_PROVIDER", default_value = "azure")]
    pub provider: ApiFlavor,

    /// Azure OpenAI resource endpoint
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Azure OpenAI API key
    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true)]
    pub azure_api_key: Option<String>,

    /// Azure OpenAI deployment name
    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT_NAME")]
    pub deployment: Option<String>,

    /// Azure OpenAI api-version
    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = "2024-06-01")]
    pub api_version: String,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Anthropic model
    #[arg(long, env = "ANTHROPIC_MODEL", default_value = "claude-sonnet-4-20250514")]
    pub model: String,

    /// Max tokens per completion
    #[arg(long, default_value_t = 4096)]
    pub max_tokens: u32,
}

impl Cli {
    /// Credentials and endpoint for the selected provider.
    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        let config = match self.provider {
            ApiFlavor::Azure => ProviderConfig {
                flavor: ApiFlavor::Azure,
                endpoint: Some(
                    self.endpoint
                        .clone()
                        .ok_or(ConfigError::Missing("AZURE_OPENAI_ENDPOINT"))?,
                ),
                api_key: self
                    .azure_api_key
                    .clone()
                    .ok_or(ConfigError::Missing("AZURE_OPENAI_API_KEY"))?,
                model: self
                    .deployment
                    .clone()
                    .ok_or(ConfigError::Missing("AZURE_OPENAI_DEPLOYMENT_NAME"))?,
                api_version: self.api_version.clone(),
                max_tokens: self.max_tokens,
            },
            ApiFlavor::Anthropic => ProviderConfig {
                flavor: ApiFlavor::Anthropic,
                endpoint: None,
                api_key: self
                    .anthropic_api_key
                    .clone()
                    .ok_or(ConfigError::Missing("ANTHROPIC_API_KEY"))?,
                model: self.model.clone(),
                api_version: self.api_version.clone(),
                max_tokens: self.max_tokens,
            },
        };
        Ok(config)
    }

    pub fn studio_config(&self) -> StudioConfig {
        StudioConfig {
            output_path: self.output.clone(),
            limits: DriverLimits {
                max_turns: self.max_turns,
                turn_timeout: Duration::from_secs(self.turn_timeout_secs),
            },
        }
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }

    /// The roster file if one was given, otherwise the built-in agents.
    pub fn roster(&self) -> Result<AgentRoster, RosterError> {
        match &self.roster {
            Some(path) => AgentRoster::load(path),
            None => Ok(AgentRoster::default()),
        }
    }
}
