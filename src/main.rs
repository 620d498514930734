//! Twitch live-status server
//!
//! # Usage
//!
//! ```bash
//! twitch-status --port 3000 --host 0.0.0.0
//! twitch-status --channel shroud --verbose
//! twitch-status --config /etc/twitch-status/config.toml
//! ```

use clap::Parser;

use twitch_live_status::{
    cli::{ServerArgs, run_server_mode},
    config::ConfigLoader,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "twitch-status")]
struct Cli {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Configuration file path
    #[arg(long)]
    config: Option<String>,

    /// Channel served by `GET /status`
    #[arg(long)]
    channel: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ConfigLoader::load_dotenv();

    run_server_mode(ServerArgs {
        port: cli.port,
        host: cli.host,
        config: cli.config,
        channel: cli.channel,
        verbose: cli.verbose,
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_options() {
        let cli = Cli::parse_from([
            "twitch-status",
            "--port",
            "8080",
            "--host",
            "0.0.0.0",
            "--channel",
            "shroud",
        ]);

        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.host, Some("0.0.0.0".to_string()));
        assert_eq!(cli.channel, Some("shroud".to_string()));
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::parse_from(["twitch-status"]);

        assert_eq!(cli.port, None);
        assert_eq!(cli.host, None);
        assert_eq!(cli.channel, None);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["twitch-status", "-p", "4000", "-v"]);

        assert_eq!(cli.port, Some(4000));
        assert!(cli.verbose);
    }

    #[test]
    fn test_rejects_invalid_port() {
        assert!(Cli::try_parse_from(["twitch-status", "--port", "70000"]).is_err());
    }

    #[test]
    fn test_config_option() {
        let cli = Cli::parse_from(["twitch-status", "--config", "/path/to/config.toml"]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
    }
}
