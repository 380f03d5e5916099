use std::time::Duration;

use anyhow::{bail, Result};
use scribe_client::ClientConfig;
use scribe_sync::SyncConfig;

use crate::cli::Cli;

/// Runtime configuration derived from CLI/env.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub sync: SyncConfig,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let api_base = cli.api_url.trim().trim_end_matches('/').to_string();
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            bail!("api url must start with http:// or https://, got {:?}", cli.api_url);
        }

        let request_timeout = (cli.request_timeout > 0).then(|| Duration::from_secs(cli.request_timeout));
        let client = ClientConfig::new(api_base).with_request_timeout(request_timeout);

        let sync = SyncConfig::default()
            .with_save_debounce(Duration::from_millis(cli.debounce_ms))
            .with_saved_display(Duration::from_millis(cli.saved_display_ms));

        Ok(Self { client, sync })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_map_onto_client_and_sync_config() {
        let cli = Cli::parse_from([
            "scribe",
            "--api-url",
            "https://blog.example/",
            "--debounce-ms",
            "500",
            "--request-timeout",
            "0",
            "posts",
            "list",
        ]);
        let config = CliConfig::from_cli(&cli).unwrap();
        assert_eq!(config.client.api_base, "https://blog.example");
        assert_eq!(config.client.request_timeout, None);
        assert_eq!(config.sync.save_debounce, Duration::from_millis(500));
        assert_eq!(config.sync.saved_display, Duration::from_secs(3));
    }

    #[test]
    fn rejects_non_http_urls() {
        let cli = Cli::parse_from(["scribe", "--api-url", "localhost:8000", "posts", "list"]);
        assert!(CliConfig::from_cli(&cli).is_err());
    }
}
