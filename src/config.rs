use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, error, info};
use url::Url;

use crate::error::{RelayError, Result};

const DEFAULT_COMPLETION_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CLEAR_COMMAND: &str = "clear";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8090";

#[derive(Debug, Clone)]
pub struct Config {
    pub completion_api_key: String,
    pub completion_api_url: Url,
    pub completion_model: String,
    pub completion_timeout: Duration,
    pub system_prompt: Option<String>,
    pub clear_command: String,
    pub listen_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        let completion_api_key = env::var("COMPLETION_API_KEY").map_err(|e| {
            error!("Failed to load COMPLETION_API_KEY from environment: {}", e);
            e
        })?;

        let completion_api_url = parse_url(
            "COMPLETION_API_URL",
            &optional_var("COMPLETION_API_URL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_API_URL.to_string()),
        )?;

        let completion_model = optional_var("COMPLETION_MODEL")
            .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string());

        let completion_timeout = match optional_var("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => parse_timeout("COMPLETION_TIMEOUT_SECS", &raw)?,
            None => Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
        };

        let system_prompt = optional_var("SYSTEM_PROMPT");

        let clear_command =
            optional_var("CLEAR_COMMAND").unwrap_or_else(|| DEFAULT_CLEAR_COMMAND.to_string());

        let listen_addr = parse_addr(
            "LISTEN_ADDR",
            &optional_var("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        )?;

        info!("Configuration loaded successfully");
        debug!(
            "Completion API key length: {} characters",
            completion_api_key.len()
        );
        debug!("Completion API URL: {}", completion_api_url);
        debug!("Completion model: {}", completion_model);
        debug!("Completion timeout: {:?}", completion_timeout);
        debug!(
            "System prompt length: {} characters",
            system_prompt.as_ref().map_or(0, String::len)
        );
        debug!("Clear command: {}", clear_command);
        debug!("Listen address: {}", listen_addr);

        Ok(Self {
            completion_api_key,
            completion_api_url,
            completion_model,
            completion_timeout,
            system_prompt,
            clear_command,
            listen_addr,
        })
    }
}

/// Reads an optional variable, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_url(name: &str, raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| {
        error!("Invalid {name}: {e}");
        RelayError::Config(format!("{name} is not a valid URL: {e}"))
    })
}

fn parse_timeout(name: &str, raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => {
            error!("Invalid {name}: {raw}");
            Err(RelayError::Config(format!(
                "{name} must be a positive number of seconds, got '{raw}'"
            )))
        }
    }
}

fn parse_addr(name: &str, raw: &str) -> Result<SocketAddr> {
    raw.trim().parse().map_err(|e| {
        error!("Invalid {name}: {e}");
        RelayError::Config(format!("{name} is not a valid socket address: {e}"))
    })
}
