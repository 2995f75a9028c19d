use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` raises the level from `info` to
/// `debug`, and `-vv` to `trace`. Output goes to stderr so stdout carries
/// only command results.
pub fn init(verbose: u8) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| CliError::LoggingInit(e.to_string()))
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::default_directive;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "info");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(5), "trace");
    }
}
