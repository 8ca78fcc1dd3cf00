use std::ffi::OsString;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use serde::Serialize;
use thiserror::Error;

pub const USAGE: &str = "kk-agent <api_key> <query> [context_json]";

#[derive(Debug, Parser)]
#[command(
    name = "kk-agent",
    version,
    about = "Ask the KK academic agent a question and print the reply as JSON"
)]
struct Args {
    /// List the models available to the API key instead of asking a question.
    #[arg(long)]
    list_models: bool,

    /// Generative Language API key.
    api_key: Option<String>,

    /// The student's question.
    #[arg(allow_hyphen_values = true)]
    query: Option<String>,

    /// Student context as JSON: {"name": .., "grade": .., "subjects": [..]}.
    #[arg(allow_hyphen_values = true)]
    context_json: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask {
        api_key: String,
        query: String,
        context_json: Option<String>,
    },
    ListModels {
        api_key: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("Missing arguments. Usage: kk-agent <api_key> <query> [context_json]")]
    MissingArguments,

    #[error("--list-models takes only <api_key>. Usage: kk-agent --list-models <api_key>")]
    UnexpectedQuery,

    #[error("{0}")]
    Invalid(String),
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Parses process arguments (including the binary name). `--help` and
/// `--version` print and exit as usual.
pub fn parse_args<I, T>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match Args::try_parse_from(args) {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let rendered = err.render().to_string();
            let first_line = rendered.lines().next().unwrap_or_default();
            return Err(UsageError::Invalid(
                first_line.trim_start_matches("error: ").trim().to_string(),
            ));
        }
    };

    let api_key = present(args.api_key).ok_or(UsageError::MissingArguments)?;

    if args.list_models {
        if args.query.is_some() || args.context_json.is_some() {
            return Err(UsageError::UnexpectedQuery);
        }
        return Ok(Command::ListModels { api_key });
    }

    let query = present(args.query).ok_or(UsageError::MissingArguments)?;
    Ok(Command::Ask {
        api_key,
        query,
        context_json: args.context_json,
    })
}

/// Writes `value` as a single JSON line on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("Failed to serialize output")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}").context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")
}

#[cfg(test)]
mod tests {
    use super::{Command, USAGE, UsageError, parse_args};

    fn parse(args: &[&str]) -> Result<Command, UsageError> {
        parse_args(std::iter::once("kk-agent").chain(args.iter().copied()))
    }

    #[test]
    fn parses_key_and_query() {
        assert_eq!(
            parse(&["key", "What is photosynthesis?"]),
            Ok(Command::Ask {
                api_key: "key".to_string(),
                query: "What is photosynthesis?".to_string(),
                context_json: None,
            })
        );
    }

    #[test]
    fn parses_optional_context() {
        let ctx = r#"{"name":"Ravi","grade":"8","subjects":[]}"#;
        assert_eq!(
            parse(&["key", "hi", ctx]),
            Ok(Command::Ask {
                api_key: "key".to_string(),
                query: "hi".to_string(),
                context_json: Some(ctx.to_string()),
            })
        );
    }

    #[test]
    fn rejects_fewer_than_two_arguments() {
        assert_eq!(parse(&[]), Err(UsageError::MissingArguments));
        assert_eq!(parse(&["key"]), Err(UsageError::MissingArguments));
        assert_eq!(parse(&["key", "   "]), Err(UsageError::MissingArguments));
    }

    #[test]
    fn missing_arguments_message_includes_usage() {
        assert_eq!(
            UsageError::MissingArguments.to_string(),
            format!("Missing arguments. Usage: {USAGE}")
        );
    }

    #[test]
    fn accepts_queries_starting_with_a_hyphen() {
        assert_eq!(
            parse(&["key", "-5 + 3 = ?"]),
            Ok(Command::Ask {
                api_key: "key".to_string(),
                query: "-5 + 3 = ?".to_string(),
                context_json: None,
            })
        );
    }

    #[test]
    fn parses_list_models() {
        assert_eq!(
            parse(&["--list-models", "key"]),
            Ok(Command::ListModels {
                api_key: "key".to_string()
            })
        );
        assert_eq!(parse(&["--list-models"]), Err(UsageError::MissingArguments));
        assert_eq!(
            parse(&["--list-models", "key", "hi"]),
            Err(UsageError::UnexpectedQuery)
        );
    }

    #[test]
    fn reports_too_many_arguments() {
        let err = parse(&["key", "q", "{}", "extra"]).expect_err("should reject extra argument");
        match err {
            UsageError::Invalid(msg) => assert!(msg.contains("extra"), "unexpected message: {msg}"),
            other => panic!("expected invalid usage, got {other:?}"),
        }
    }
}
