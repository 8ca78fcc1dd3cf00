use std::process::ExitCode;

use serde_json::json;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = kk_agent::logging::init();

    let Err(err) = kk_agent::run().await else {
        return ExitCode::SUCCESS;
    };

    let message = format!("{err:#}");
    tracing::error!(error = %message, "kk-agent failed");
    if let Err(print_err) = kk_agent::cli::print_json(&json!({ "error": message })) {
        eprintln!("kk-agent: {print_err:#}");
    }
    ExitCode::FAILURE
}
