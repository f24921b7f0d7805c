use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use feed_aggregator::cli::{Cli, Commands};
use feed_aggregator::config::{load_dotenv, Config};
use feed_aggregator::dates::Timestamp;
use feed_aggregator::logging;
use feed_aggregator::services::{
    render_atom, render_html, AggregateOptions, AggregateService, Aggregation, HttpFetcher,
};
use feed_aggregator::sources::ExtractorRegistry;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let debug_flag = matches!(cli.command, Commands::Run { debug: true, .. });
    logging::init(&config.logging.level, config.debug || debug_flag);

    match cli.command {
        Commands::Run {
            name,
            atom,
            html,
            debug,
        } => cmd_run(
            &config,
            name.as_deref(),
            atom.as_deref(),
            html.as_deref(),
            config.debug || debug,
        ),
        Commands::List => cmd_list(&config),
    }
}

fn cmd_run(
    config: &Config,
    name: Option<&str>,
    atom: Option<&Path>,
    html: Option<&Path>,
    debug: bool,
) -> Result<()> {
    let feeds = match name {
        Some(name) => {
            let feed = config
                .feed(name)
                .ok_or_else(|| anyhow!("No feed named {} in the configuration", name))?;
            std::slice::from_ref(feed)
        }
        None => config.feeds.as_slice(),
    };

    let fetcher = HttpFetcher::new(&config.fetch).context("Failed to build HTTP client")?;
    let service = AggregateService::new(ExtractorRegistry::new(), AggregateOptions { debug });

    println!("Fetching {} feeds...\n", feeds.len());
    let aggregation = service.run(&fetcher, feeds);
    print_reports(&aggregation);

    let generated_at = Timestamp::now();

    if let Some(path) = atom {
        let xml = render_atom(&config.site, &aggregation.posts, generated_at)?;
        write_output(path, &xml)?;
        println!("Wrote Atom feed to {}", path.display());
    }

    if let Some(path) = html {
        let page = render_html(&config.site, &aggregation.posts, generated_at);
        write_output(path, &page)?;
        println!("Wrote HTML page to {}", path.display());
    }

    if atom.is_none() && html.is_none() {
        for post in &aggregation.posts {
            println!("  {}  {} ({})", post.published, post.title, post.source.display_name());
        }
    }

    Ok(())
}

fn print_reports(aggregation: &Aggregation) {
    for report in &aggregation.reports {
        match &report.error {
            Some(error) => println!("  {}: FAILED: {}", report.name, error),
            None => println!(
                "  {}: {} posts ({} filtered, {} skipped)",
                report.name, report.posts, report.entries_filtered, report.entries_skipped
            ),
        }
    }
    println!();

    let failed = aggregation.failures().count();
    println!(
        "Aggregated {} posts from {} of {} feeds ({} entries filtered, {} skipped).",
        aggregation.posts.len(),
        aggregation.reports.len() - failed,
        aggregation.reports.len(),
        aggregation.entries_filtered(),
        aggregation.entries_skipped()
    );
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

fn cmd_list(config: &Config) -> Result<()> {
    if config.feeds.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    println!("Configured feeds:\n");
    for feed in &config.feeds {
        println!("  {}", feed.name);
        println!("    URL: {}", feed.url);
        if let Some(specs) = &feed.category {
            println!("    Category: {}", describe_specs(specs));
        }
        if let Some(specs) = &feed.posts {
            println!("    Posts: {}", describe_specs(specs));
        }
        if feed.policy().is_include_all() {
            println!("    Includes all entries");
        }
        println!();
    }

    Ok(())
}

fn describe_specs(specs: &[BTreeMap<String, String>]) -> String {
    if specs.is_empty() {
        return "(none, excludes every entry)".to_string();
    }

    specs
        .iter()
        .map(|spec| {
            let pairs: Vec<String> = spec.iter().map(|(k, v)| format!("{}={:?}", k, v)).collect();
            format!("{{{}}}", pairs.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" or ")
}
