use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use foundation::{Coordinate, LanguageCode};
use overlay::{OverlayConfig, StalePolicy};
use tracing::debug;

use crate::error::CliError;

/// Overlay settings shared by every subcommand.
///
/// Values come from `--config` first, then environment variables and flags
/// on top.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON file with overlay settings
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Encyclopedia language (subdomain), e.g. en, de, fr
    #[arg(long, env = "EXPLORER_LANG", global = true)]
    pub lang: Option<LanguageCode>,

    /// API host without the language prefix
    #[arg(long, env = "EXPLORER_HOST", global = true)]
    pub host: Option<String>,

    /// Quiet period before a viewport change triggers a fetch
    #[arg(long, env = "EXPLORER_DEBOUNCE_MS", global = true)]
    pub debounce_ms: Option<u64>,

    /// Geosearch radius in meters
    #[arg(long, env = "EXPLORER_RADIUS_M", global = true)]
    pub radius_m: Option<u32>,

    /// Maximum articles per geosearch
    #[arg(long, env = "EXPLORER_LIMIT", global = true)]
    pub limit: Option<u32>,

    /// What to do with results for a superseded viewport: merge or discard
    #[arg(long, env = "EXPLORER_STALE_RESULTS", global = true)]
    pub stale_results: Option<StalePolicy>,

    /// Device position as LAT,LON; geolocation is unavailable without it
    #[arg(long, env = "EXPLORER_LOCATION", global = true, allow_hyphen_values = true)]
    pub location: Option<Coordinate>,
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<OverlayConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => load_file(path)?,
            None => OverlayConfig::default(),
        };
        if let Some(lang) = &self.lang {
            config.language = lang.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        if let Some(radius) = self.radius_m {
            config.radius_m = radius;
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if let Some(policy) = self.stale_results {
            config.stale_results = policy;
        }
        debug!(?config, "overlay configuration resolved");
        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<OverlayConfig, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_config(&text)
        .map_err(|e| CliError::Config(format!("invalid {}: {e}", path.display())))
}

fn parse_config(text: &str) -> Result<OverlayConfig, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use foundation::LanguageCode;
    use overlay::{OverlayConfig, StalePolicy};
    use pretty_assertions::assert_eq;

    use super::{ConfigArgs, parse_config};
    use crate::error::CliError;

    #[test]
    fn no_overrides_yields_defaults() {
        let config = ConfigArgs::default().resolve().unwrap();
        assert_eq!(config, OverlayConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = ConfigArgs {
            lang: Some(LanguageCode::new("fr").unwrap()),
            debounce_ms: Some(50),
            stale_results: Some(StalePolicy::Discard),
            ..ConfigArgs::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.language.as_str(), "fr");
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.stale_results, StalePolicy::Discard);
        assert_eq!(config.radius_m, 10_000);
    }

    #[test]
    fn config_text_rejects_bad_language() {
        assert!(parse_config(r#"{"language": "EN!"}"#).is_err());
        let config = parse_config(r#"{"host": "example.org", "limit": 10}"#).unwrap();
        assert_eq!(config.host, "example.org");
        assert_eq!(config.limit, 10);
    }

    #[test]
    fn missing_file_is_config_error() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/explorer.json")),
            ..ConfigArgs::default()
        };
        assert!(matches!(args.resolve(), Err(CliError::Config(_))));
    }
}
