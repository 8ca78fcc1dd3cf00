pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod forwarder;
pub mod logging;
pub mod prompt;
pub mod providers;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use std::env;
use tracing::info;

use cli::Command;
use config::Config;
use forwarder::{ForwardRequest, forward};
use providers::gemini;

/// Runs one invocation. The caller is expected to have loaded `.env` and
/// installed logging; see `main.rs`.
pub async fn run() -> Result<()> {
    let cfg = Config::from_env();
    info!(
        base_url = %cfg.base_url,
        candidates = ?cfg.candidates.iter().map(|c| c.label()).collect::<Vec<_>>(),
        model_timeout_secs = cfg.model_timeout_secs,
        debug_dump = cfg.debug_dump_path.is_some(),
        "loaded runtime configuration"
    );

    let command = cli::parse_args(env::args_os())?;
    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;

    match command {
        Command::Ask {
            api_key,
            query,
            context_json,
        } => {
            let request = ForwardRequest {
                api_key: &api_key,
                query: &query,
                context_json: context_json.as_deref(),
            };
            let reply = forward(&client, &cfg, &request).await;
            cli::print_json(&json!({ "response": reply }))
        }
        Command::ListModels { api_key } => {
            let models = gemini::list_models(&client, &cfg, &api_key)
                .await
                .context("Failed to list models")?;
            cli::print_json(&json!({ "models": models }))
        }
    }
}
