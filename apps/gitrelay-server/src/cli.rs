//! Command-line argument parsing

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gitrelay-server",
    about = "Relays GitHub and GitLab webhooks to Telegram chats",
    version
)]
pub struct Args {
    /// Path to a configuration file; environment variables alone are used when absent
    #[arg(short, long, env = "GITRELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interface to bind, overriding the configured host
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// HTTP server port, overriding the configured port
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,

    /// Enable JSON log format (useful for production)
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["gitrelay-server"]).unwrap();
        assert_eq!(args.log_level, "info");
        assert!(args.config.is_none());
        assert!(args.port.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "gitrelay-server",
            "--config",
            "gitrelay.toml",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--json-logs",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("gitrelay.toml")));
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.port, Some(9000));
        assert!(args.json_logs);
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Args::try_parse_from(["gitrelay-server", "--log-level", "loud"]).is_err());
    }
}
