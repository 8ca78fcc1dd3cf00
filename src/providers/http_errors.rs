use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::error::ForwardError;

fn error_chain_any(
    err: &(dyn StdError + 'static),
    kind: ErrorKind,
    needle: &str,
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_any(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_any(err, ErrorKind::TimedOut, "timed out")
}

/// Renders `err` and its sources as `outer: inner: root`, skipping sources
/// whose text is already contained in the previous level.
fn describe_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        if !text.is_empty() && !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        current = source.source();
    }
    out
}

/// DNS, TLS and unreachable-host failures keep their cause chain so the
/// student-facing message says why the connection failed.
fn connect_failure(err: &(dyn StdError + 'static), endpoint: &str) -> ForwardError {
    if error_chain_has_connection_refused(err) {
        return ForwardError::Transport(format!(
            "connection refused by model API at '{endpoint}'"
        ));
    }

    ForwardError::Transport(format!(
        "failed to connect to model API at '{}': {}",
        endpoint,
        describe_chain(err)
    ))
}

/// Maps a transport failure to a [`ForwardError`]. `endpoint` must already be
/// free of the API key; the URL carried inside `err` is dropped for the same reason.
pub(crate) fn classify_request_error(
    err: reqwest::Error,
    endpoint: &str,
    timeout_secs: u64,
) -> ForwardError {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return ForwardError::Timeout { timeout_secs };
    }

    let err = err.without_url();
    if err.is_connect() {
        return connect_failure(&err, endpoint);
    }

    ForwardError::Transport(format!(
        "failed to call model API at '{}': {}",
        endpoint,
        describe_chain(&err)
    ))
}
