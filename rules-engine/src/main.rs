use std::io::{self, Read, Write};

use anyhow::Context;
use envconfig::Envconfig;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use rules_engine::api::errors::RulesEngineError;
use rules_engine::config::Config;
use rules_engine::host::{check_flag_json, HostOutput};

// One byte past the configured limit, so oversized input is detectable.
fn read_limit(max_input_bytes: usize) -> u64 {
    u64::try_from(max_input_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1)
}

fn main() -> anyhow::Result<()> {
    let config = Config::init_from_env().context("Invalid configuration")?;

    // stdout carries the output document, so logs go to stderr
    let debug: bool = *config.debug;
    let log_layer = {
        let base_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true);

        if debug {
            base_layer
                .with_span_events(
                    FmtSpan::NEW
                        | FmtSpan::CLOSE
                        | FmtSpan::ENTER
                        | FmtSpan::EXIT
                        | FmtSpan::ACTIVE,
                )
                .with_ansi(true)
                .with_filter(EnvFilter::from_default_env())
                .boxed()
        } else {
            base_layer
                .json()
                .with_filter(EnvFilter::from_default_env())
                .boxed()
        }
    };

    tracing_subscriber::registry().with(log_layer).init();

    let mut input = String::new();
    io::stdin()
        .lock()
        .take(read_limit(config.max_input_bytes))
        .read_to_string(&mut input)
        .context("failed to read input from stdin")?;

    let output = if input.len() > config.max_input_bytes {
        let err = RulesEngineError::InputTooLarge {
            limit: config.max_input_bytes,
        };
        tracing::warn!(error_code = err.error_code(), "{}", err);
        HostOutput::from_error(&err).to_json()
    } else {
        check_flag_json(&input)
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", output).context("failed to write output")?;
    stdout.flush().context("failed to flush output")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_limit_does_not_overflow() {
        assert_eq!(read_limit(10), 11);
        assert_eq!(read_limit(0), 1);
        assert!(read_limit(usize::MAX) >= u64::try_from(usize::MAX).unwrap_or(u64::MAX));
    }
}
