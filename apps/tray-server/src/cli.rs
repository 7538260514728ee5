//! Command line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use accent_protocol::DEFAULT_PORT;

#[derive(Debug, Parser)]
#[command(name = "accent-tray-server", version, about)]
pub struct Cli {
    /// Configuration file (defaults to the per-user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Default, Subcommand)]
pub enum Command {
    /// Run the tray supervisor (default).
    #[default]
    Run,
    /// Run the color service in the foreground. Spawned by the supervisor.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Loopback port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Allow cross-origin GET/OPTIONS requests.
    #[arg(long)]
    pub cors: bool,
}

impl ServeArgs {
    /// Arguments that reproduce these settings on a spawned worker.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["serve".to_string(), "--port".into(), self.port.to_string()];
        if self.cors {
            args.push("--cors".into());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["accent-tray-server"]).unwrap();
        assert!(matches!(cli.command.unwrap_or_default(), Command::Run));
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["accent-tray-server", "serve"]).unwrap();
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, 28546);
                assert!(!args.cors);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn serve_args_roundtrip() {
        let args = ServeArgs {
            port: 9000,
            cors: true,
        };
        let mut argv = vec!["accent-tray-server".to_string()];
        argv.extend(args.to_args());

        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Some(Command::Serve(parsed)) => {
                assert_eq!(parsed.port, 9000);
                assert!(parsed.cors);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn global_config_flag() {
        let cli =
            Cli::try_parse_from(["accent-tray-server", "--config", "/tmp/a.toml", "run"]).unwrap();
        assert_eq!(cli.config.unwrap(), PathBuf::from("/tmp/a.toml"));
    }
}
