use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod api;
mod config;
mod daemon;
mod middleware;
mod websocket;

use config::{DaemonConfig, ModeSetting};

#[derive(Parser, Debug)]
#[command(name = "gorev")]
#[command(about = "Task management daemon with MCP tools for AI assistants", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the daemon
    Daemon(DaemonArgs),
    /// Stop the running daemon
    DaemonStop,
    /// Show the running daemon's lock file and health
    DaemonStatus,
    /// Bridge MCP stdio to the daemon, starting it if needed
    McpProxy {
        /// Log debug output to stderr
        #[arg(long)]
        debug: bool,

        /// Daemon port when one has to be started
        #[arg(long, env = "GOREV_API_PORT", default_value_t = gorev_client::DEFAULT_PORT)]
        port: u16,
    },
}

#[derive(Args, Debug)]
struct DaemonArgs {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Start in the background and exit once healthy
    #[arg(long)]
    detach: bool,

    /// Storage mode
    #[arg(long, value_enum)]
    mode: Option<ModeSetting>,

    /// Shared database file for centralized mode
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl DaemonArgs {
    fn resolve(&self) -> Result<DaemonConfig> {
        let mut config = DaemonConfig::load(self.config.as_deref())?;
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(db_path) = &self.db_path {
            config.db_path = Some(db_path.clone());
        }
        Ok(config)
    }

    /// Flags handed to the detached child, minus `--detach`.
    fn forwarded(&self, port: u16) -> Vec<String> {
        let mut args = vec!["--port".to_string(), port.to_string()];
        if let Some(mode) = self.mode {
            let mode = match mode {
                ModeSetting::Local => "local",
                ModeSetting::Centralized => "centralized",
            };
            args.extend(["--mode".to_string(), mode.to_string()]);
        }
        if let Some(db_path) = &self.db_path {
            args.extend(["--db-path".to_string(), db_path.display().to_string()]);
        }
        if let Some(config) = &self.config {
            args.extend(["--config".to_string(), config.display().to_string()]);
        }
        args
    }
}

fn init_tracing(default_filter: &str) {
    // stdout belongs to the MCP protocol in proxy mode
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon(args) => {
            init_tracing("gorev=info,tower_http=debug");
            let config = args.resolve()?;
            if args.detach {
                let exe = std::env::current_exe().context("Failed to locate own executable")?;
                let lock = daemon::start_detached(&exe, &args.forwarded(config.port), config.port).await?;
                println!("gorev daemon started (pid {}) at {}", lock.pid, lock.daemon_url);
            } else {
                tracing::info!(port = config.port, mode = ?config.mode, "Starting gorev daemon");
                daemon::run_foreground(config).await?;
            }
        }
        Commands::DaemonStop => {
            init_tracing("gorev=info");
            let pid = daemon::stop().await?;
            println!("gorev daemon (pid {}) stopped", pid);
        }
        Commands::DaemonStatus => {
            init_tracing("warn");
            let status = daemon::status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::McpProxy { debug, port } => {
            init_tracing(if debug { "debug" } else { "warn" });
            let exe = std::env::current_exe().context("Failed to locate own executable")?;
            let mut options = gorev_mcp::ProxyOptions::new(exe);
            options.port = port;
            gorev_mcp::proxy::run(options).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_daemon_flags_override_config() {
        let cli = Cli::try_parse_from([
            "gorev", "daemon", "--port", "6100", "--mode", "centralized", "--db-path", "/tmp/g.db",
        ])
        .unwrap();
        let Commands::Daemon(args) = cli.command else {
            panic!("expected daemon command");
        };
        assert!(!args.detach);
        assert_eq!(
            args.forwarded(6100),
            vec!["--port", "6100", "--mode", "centralized", "--db-path", "/tmp/g.db"]
        );
    }

    #[test]
    fn test_mcp_proxy_debug_flag() {
        let cli = Cli::try_parse_from(["gorev", "mcp-proxy", "--debug"]).unwrap();
        assert!(matches!(cli.command, Commands::McpProxy { debug: true, .. }));
        assert!(Cli::try_parse_from(["gorev", "daemon-status"]).is_ok());
        assert!(Cli::try_parse_from(["gorev", "daemon", "--mode", "bogus"]).is_err());
    }
}
