//! tracing_subscriber setup for the command-line driver

use std::{io::IsTerminal, sync::Once};

use tracing_subscriber::{filter::LevelFilter, EnvFilter};

static PIVOTSQL_LOG_ENV_VAR: &str = "PIVOTSQL_LOG";

/// Crates whose level follows `PIVOTSQL_LOG`
const PIVOTSQL_CRATES: &[&str] = &["pivotsql", "pivotsql_cli"];

/// Initializes a tracing subscriber writing to stderr.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (env_filter, log_level) = env_filter_and_log_level();

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();

        tracing::debug!("log level: {}", log_level);
    });
}

fn env_filter_and_log_level() -> (EnvFilter, String) {
    // RUST_LOG directives win over PIVOTSQL_LOG for the crates they name
    let directive_string = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let mut env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(&directive_string);

    let log_level = std::env::var(PIVOTSQL_LOG_ENV_VAR).unwrap_or_else(|_| "info".to_string());

    for crate_name in PIVOTSQL_CRATES {
        if directive_string.contains(&format!("{crate_name}=")) {
            continue;
        }
        if let Ok(directive) = format!("{crate_name}={log_level}").parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    (env_filter, log_level)
}
