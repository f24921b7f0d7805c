use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feed-aggregator")]
#[command(about = "Merge RSS and Atom feeds into one Atom feed and HTML page")]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, env = "FEED_AGGREGATOR_CONFIG", default_value = "feeds.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every configured feed and write the merged output
    Run {
        /// Only process the feed with this configured name
        #[arg(short, long)]
        name: Option<String>,

        /// Write the combined Atom feed to this path
        #[arg(long)]
        atom: Option<PathBuf>,

        /// Write the HTML page to this path
        #[arg(long)]
        html: Option<PathBuf>,

        /// Log each entry decision (overrides `debug` in the config)
        #[arg(long)]
        debug: bool,
    },

    /// List configured feeds and their filters
    List,
}
