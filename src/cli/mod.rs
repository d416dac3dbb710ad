pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "Aggregates recent posts from external blogging platforms", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.config/tributary/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the merged feed, most recent first
    Posts {
        /// Only show posts from this source (case-insensitive)
        #[arg(short, long)]
        source: Option<String>,

        /// Maximum number of posts to print
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print canonical posts as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured sources with their post counts
    Sources,
    /// Serve the feed over HTTP
    Serve {
        /// Listen address (overrides [server] addr)
        #[arg(short, long)]
        addr: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_posts_flags() {
        let cli = Cli::try_parse_from(["tributary", "posts", "-s", "Dev.to", "-n", "5", "--json"]).unwrap();
        match cli.command {
            Commands::Posts { source, limit, json } => {
                assert_eq!(source.as_deref(), Some("Dev.to"));
                assert_eq!(limit, Some(5));
                assert!(json);
            }
            _ => panic!("expected posts"),
        }
    }

    #[test]
    fn test_config_is_global() {
        let cli = Cli::try_parse_from(["tributary", "serve", "--config", "/tmp/t.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
        assert!(matches!(cli.command, Commands::Serve { addr: None }));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["tributary"]).is_err());
    }
}
