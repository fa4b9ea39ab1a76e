// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialdesk - outbound call scheduling.
//!
//! This is the binary entry point for the Dialdesk service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use dialdesk_config::DialdeskConfig;

/// Dialdesk - schedule, retry and place outbound calls.
#[derive(Parser, Debug)]
#[command(name = "dialdesk", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the API server and the dispatch loop.
    Serve,
    /// Run a single dispatch pass and exit.
    DispatchOnce,
    /// Inspect Dialdesk configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate the configuration and report any errors.
    Check,
    /// Print the effective configuration with secrets redacted.
    Show,
}

fn load_config(path: Option<&Path>) -> DialdeskConfig {
    let result = match path {
        Some(path) => dialdesk_config::load_and_validate_path(path),
        None => dialdesk_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            dialdesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Effective configuration as TOML, with credentials masked.
fn redacted_toml(config: &DialdeskConfig) -> Result<String, toml::ser::Error> {
    let mut config = config.clone();
    if config.server.bearer_token.is_some() {
        config.server.bearer_token = Some("[REDACTED]".to_string());
    }
    if config.telephony.api_key.is_some() {
        config.telephony.api_key = Some("[REDACTED]".to_string());
    }
    toml::to_string_pretty(&config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::DispatchOnce) => serve::run_dispatch_once(config).await,
        Some(Commands::Config { action }) => match action {
            ConfigCommands::Check => {
                println!("dialdesk: configuration is valid");
                Ok(())
            }
            ConfigCommands::Show => match redacted_toml(&config) {
                Ok(rendered) => {
                    print!("{rendered}");
                    Ok(())
                }
                Err(e) => Err(dialdesk_core::DialdeskError::Config(format!(
                    "failed to render configuration: {e}"
                ))),
            },
        },
        None => {
            println!("dialdesk: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("dialdesk: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = dialdesk_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.server.port, 8000);
        assert!(config.dispatch.enabled);
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["dialdesk", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert!(cli.config.is_none());

        let cli = Cli::try_parse_from(["dialdesk", "dispatch-once", "--config", "/tmp/d.toml"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::DispatchOnce)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/d.toml")));

        let cli = Cli::try_parse_from(["dialdesk", "config", "check"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommands::Check
            })
        ));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["dialdesk", "shell"]).is_err());
    }

    #[test]
    fn show_masks_credentials() {
        let config = dialdesk_config::load_and_validate_str(
            r#"
[server]
bearer_token = "sekrit-token"

[telephony]
endpoint = "http://localhost:9000"
api_key = "provider-key"
"#,
        )
        .unwrap();
        let rendered = redacted_toml(&config).unwrap();
        assert!(!rendered.contains("sekrit-token"));
        assert!(!rendered.contains("provider-key"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("http://localhost:9000"));
    }
}
