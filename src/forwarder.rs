use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::context::StudentContext;
use crate::error::{ForwardError, no_candidate_message};
use crate::prompt::system_instruction;
use crate::providers::gemini::{self, GenerateContentRequest};

/// One question from a student.
#[derive(Debug, Clone, Copy)]
pub struct ForwardRequest<'a> {
    pub api_key: &'a str,
    pub query: &'a str,
    /// Serialized [`StudentContext`]; ignored when it does not parse.
    pub context_json: Option<&'a str>,
}

/// Asks the configured model `request.query` and returns the reply text.
///
/// Endpoint candidates are tried in order until one answers with a success
/// status. Failures never escape: if every candidate fails, the fallback
/// message for the last failure is returned instead.
pub async fn forward(client: &Client, cfg: &Config, request: &ForwardRequest<'_>) -> String {
    let context = StudentContext::parse(request.context_json);
    let system = system_instruction(context.as_ref());
    let body = GenerateContentRequest::new(&system, request.query, cfg.generation);

    let mut last_error = None;
    for (attempt, candidate) in cfg.candidates.iter().enumerate() {
        match gemini::generate_content(client, cfg, candidate, request.api_key, &body).await {
            Ok(Some(text)) => {
                info!(
                    endpoint = %candidate.label(),
                    attempt,
                    has_context = context.is_some(),
                    "model answered query"
                );
                return text;
            }
            Ok(None) => {
                warn!(endpoint = %candidate.label(), attempt, "model returned no candidates");
                return no_candidate_message();
            }
            Err(err) => {
                if let ForwardError::Status {
                    status, raw_body, ..
                } = &err
                    && let Some(path) = &cfg.debug_dump_path
                {
                    write_debug_dump(path, *status, raw_body);
                }
                warn!(
                    endpoint = %candidate.label(),
                    attempt,
                    remaining = cfg.candidates.len() - attempt - 1,
                    error = %err,
                    "model endpoint failed"
                );
                last_error = Some(err);
            }
        }
    }

    last_error
        .unwrap_or_else(|| ForwardError::Transport("no model endpoints configured".to_string()))
        .fallback_message()
}

fn write_debug_dump(path: &Path, status: u16, raw_body: &str) {
    let contents = format!(
        "Time: {}\nStatus: {}\nResponse: {}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        status,
        raw_body
    );
    if let Err(err) = fs::write(path, contents) {
        warn!(path = %path.display(), error = %err, "failed to write debug dump");
    }
}
