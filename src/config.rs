use std::env;
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_API_VERSION: &str = "v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const MAX_TEMPERATURE: f32 = 2.0;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// One `(api version, model)` pair the forwarder may call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    pub api_version: String,
    pub model: String,
}

impl EndpointCandidate {
    pub fn new(api_version: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            model: model.into(),
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.api_version, self.model)
    }
}

impl Default for EndpointCandidate {
    fn default() -> Self {
        Self::new(DEFAULT_API_VERSION, DEFAULT_MODEL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    /// Tried in order until one attempt produces a successful response. Never empty.
    pub candidates: Vec<EndpointCandidate>,
    pub model_timeout_secs: u64,
    pub generation: GenerationParams,
    pub debug_dump_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            candidates: vec![EndpointCandidate::default()],
            model_timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
            generation: GenerationParams::default(),
            debug_dump_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let base_url = get_var("GEMINI_BASE_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            base_url,
            candidates: parse_candidates(get_var("GEMINI_MODELS").as_deref()),
            model_timeout_secs: parse_positive_u64(
                get_var("MODEL_TIMEOUT_SECS").as_deref(),
                DEFAULT_MODEL_TIMEOUT_SECS,
            ),
            generation: GenerationParams {
                temperature: parse_temperature(get_var("MODEL_TEMPERATURE").as_deref()),
                max_output_tokens: parse_max_output_tokens(
                    get_var("MODEL_MAX_OUTPUT_TOKENS").as_deref(),
                ),
            },
            debug_dump_path: parse_optional_path(get_var("DEBUG_DUMP_PATH").as_deref()),
        }
    }
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_max_output_tokens(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS)
}

fn parse_temperature(raw: Option<&str>) -> f32 {
    raw.and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite() && (0.0..=MAX_TEMPERATURE).contains(value))
        .unwrap_or(DEFAULT_TEMPERATURE)
}

fn parse_optional_path(raw: Option<&str>) -> Option<PathBuf> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn parse_candidate(entry: &str) -> Option<EndpointCandidate> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    match entry.split_once('/') {
        Some((version, model)) => {
            let (version, model) = (version.trim(), model.trim());
            if version.is_empty() || model.is_empty() || model.contains('/') {
                None
            } else {
                Some(EndpointCandidate::new(version, model))
            }
        }
        None => Some(EndpointCandidate::new(DEFAULT_API_VERSION, entry)),
    }
}

fn parse_candidates(raw: Option<&str>) -> Vec<EndpointCandidate> {
    let candidates: Vec<EndpointCandidate> = raw
        .unwrap_or_default()
        .split(',')
        .filter_map(parse_candidate)
        .collect();

    if candidates.is_empty() {
        vec![EndpointCandidate::default()]
    } else {
        candidates
    }
}
