//! PortWatch CLI - Monitor listening ports and the processes behind them
//!
//! A command-line tool for listing ports, killing processes,
//! and managing favorites/watched ports.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portwatch")]
#[command(author, version, about = "Monitor listening ports and the processes behind them")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Use this config file instead of ~/.portwatch/config.json
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List listening ports plus favorite/watched placeholders
    #[command(alias = "ls")]
    List(commands::list::ListArgs),

    /// Kill the process listening on a port
    Kill {
        /// Port number to kill
        #[arg(value_parser = port_parser())]
        port: u16,

        /// Force kill (SIGKILL) without graceful shutdown
        #[arg(short, long)]
        force: bool,
    },

    /// Manage favorite ports
    #[command(alias = "fav")]
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Manage watched ports
    Watch {
        #[command(subcommand)]
        action: WatchAction,
    },

    /// Drop a port from both favorites and the watch list
    Forget {
        #[arg(value_parser = port_parser())]
        port: u16,
    },

    /// Keep scanning and print watched-port transitions until Ctrl-C
    Monitor {
        /// Seconds between scans (saved to the config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Add a port to favorites
    Add {
        #[arg(value_parser = port_parser())]
        port: u16,
    },
    /// Remove a port from favorites
    #[command(alias = "rm")]
    Remove {
        #[arg(value_parser = port_parser())]
        port: u16,
    },
    /// Add the port if missing, remove it otherwise
    Toggle {
        #[arg(value_parser = port_parser())]
        port: u16,
    },
    /// List all favorite ports
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
enum WatchAction {
    /// Add a port to watch list
    Add {
        #[arg(value_parser = port_parser())]
        port: u16,
        /// Notify on port start
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        on_start: bool,
        /// Notify on port stop
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        on_stop: bool,
    },
    /// Remove a port from watch list
    #[command(alias = "rm")]
    Remove {
        #[arg(value_parser = port_parser())]
        port: u16,
    },
    /// Watch the port if unwatched, stop watching otherwise
    Toggle {
        #[arg(value_parser = port_parser())]
        port: u16,
    },
    /// Change notification settings of a watched port
    Update {
        #[arg(value_parser = port_parser())]
        port: u16,
        #[arg(long, action = clap::ArgAction::Set)]
        on_start: bool,
        #[arg(long, action = clap::ArgAction::Set)]
        on_stop: bool,
    },
    /// List all watched ports
    #[command(alias = "ls")]
    List,
}

/// Port numbers 1-65535; 0 is not a listening port.
fn port_parser() -> clap::builder::RangedI64ValueParser<u16> {
    clap::value_parser!(u16).range(1..)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = commands::Context {
        json: cli.json,
        config_path: cli.config,
    };

    match cli.command {
        Some(Commands::List(args)) => commands::list::run(&ctx, args).await?,
        Some(Commands::Kill { port, force }) => commands::kill::run(&ctx, port, force).await?,
        Some(Commands::Favorites { action }) => match action {
            FavoritesAction::Add { port } => commands::favorites::add(&ctx, port).await?,
            FavoritesAction::Remove { port } => commands::favorites::remove(&ctx, port).await?,
            FavoritesAction::Toggle { port } => commands::favorites::toggle(&ctx, port).await?,
            FavoritesAction::List => commands::favorites::list(&ctx).await?,
        },
        Some(Commands::Watch { action }) => match action {
            WatchAction::Add {
                port,
                on_start,
                on_stop,
            } => commands::watch::add(&ctx, port, on_start, on_stop).await?,
            WatchAction::Remove { port } => commands::watch::remove(&ctx, port).await?,
            WatchAction::Toggle { port } => commands::watch::toggle(&ctx, port).await?,
            WatchAction::Update {
                port,
                on_start,
                on_stop,
            } => commands::watch::update(&ctx, port, on_start, on_stop).await?,
            WatchAction::List => commands::watch::list(&ctx).await?,
        },
        Some(Commands::Forget { port }) => commands::favorites::forget(&ctx, port).await?,
        Some(Commands::Monitor { interval }) => commands::monitor::run(&ctx, interval).await?,
        Some(Commands::Config) => commands::config::show(&ctx).await?,
        None => {
            // Default: list everything, ordered by port
            commands::list::run(&ctx, commands::list::ListArgs::default()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_zero_is_rejected() {
        assert!(Cli::try_parse_from(["portwatch", "kill", "0"]).is_err());
        assert!(Cli::try_parse_from(["portwatch", "favorites", "add", "0"]).is_err());
        assert!(Cli::try_parse_from(["portwatch", "watch", "toggle", "0"]).is_err());
        assert!(Cli::try_parse_from(["portwatch", "forget", "0"]).is_err());
    }

    #[test]
    fn test_port_range_bounds() {
        assert!(Cli::try_parse_from(["portwatch", "kill", "1"]).is_ok());
        assert!(Cli::try_parse_from(["portwatch", "favorites", "add", "65535"]).is_ok());
        assert!(Cli::try_parse_from(["portwatch", "watch", "add", "65536"]).is_err());
    }
}
