//! robots-policy command-line entry point
//!
//! Resolves robots.txt policies through the configured fetch executor and
//! prints the allow/crawl-delay decision for each URL given.

use clap::Parser;
use robots_policy::config::{load_config_with_hash, Config};
use robots_policy::{crawl_delay, is_allowed, is_robots_url, PolicyResolver, RobotsPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// robots-policy: check URLs against their sites' robots.txt
///
/// Each URL's site policy is fetched through the fetch executor named in the
/// configuration. URLs on the same site share one retrieval when the cache
/// is enabled.
#[derive(Parser, Debug)]
#[command(name = "robots-policy")]
#[command(version)]
#[command(about = "Check URLs against robots.txt", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URLs to check
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Give up resolving a site's policy after this many seconds
    #[arg(long, value_name = "SECS")]
    deadline: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let deadline = cli.deadline.map(Duration::from_secs);
    let unresolved = handle_check(config, cli.urls, deadline).await?;

    if unresolved > 0 {
        return Err(format!("{} URL(s) have an unknown policy", unresolved).into());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("robots_policy=info,warn"),
            1 => EnvFilter::new("robots_policy=debug,info"),
            2 => EnvFilter::new("robots_policy=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves every URL concurrently and prints one line per URL
///
/// Returns how many URLs could not be decided, either because their site's
/// policy could not be resolved or because the URL itself was unusable.
async fn handle_check(
    config: Config,
    urls: Vec<String>,
    deadline: Option<Duration>,
) -> Result<usize, Box<dyn std::error::Error>> {
    let agent = config.agent.name.clone();
    let resolver = Arc::new(PolicyResolver::from_config(&config)?);

    tracing::info!(
        "Checking {} URL(s) as {} via {}",
        urls.len(),
        agent,
        resolver.fetcher().endpoint()
    );

    let mut handles = Vec::with_capacity(urls.len());
    for url in urls {
        let resolver = Arc::clone(&resolver);
        handles.push(tokio::spawn(async move {
            if is_robots_url(&url) {
                return (url, None);
            }
            let result = match deadline {
                Some(deadline) => resolver.resolve_within(&url, deadline).await,
                None => resolver.resolve(&url).await,
            };
            (url, Some(result))
        }));
    }

    let mut unresolved = 0;
    for handle in handles {
        let (url, outcome) = handle.await?;
        let (line, decided) = report_line(&url, outcome, &agent);
        println!("{}", line);
        if !decided {
            unresolved += 1;
        }
    }

    Ok(unresolved)
}

/// Formats the output line for one URL
///
/// Returns the line and whether a decision was reached. URLs whose policy
/// could not be resolved or applied are reported as `unknown`.
fn report_line(
    url: &str,
    outcome: Option<robots_policy::Result<Arc<RobotsPolicy>>>,
    agent: &str,
) -> (String, bool) {
    let policy = match outcome {
        None => return (format!("{}\tskipped (robots.txt itself)", url), true),
        Some(Ok(policy)) => policy,
        Some(Err(e)) => {
            tracing::error!("Policy unknown for {}: {}", url, e);
            return (format!("{}\tunknown", url), false);
        }
    };

    match is_allowed(url, Some(&*policy), agent) {
        Ok(allowed) => (
            format!(
                "{}\t{}\tcrawl-delay={:?}",
                url,
                if allowed { "allowed" } else { "disallowed" },
                crawl_delay(Some(&*policy), agent)
            ),
            true,
        ),
        Err(e) => {
            tracing::error!("Cannot decide {}: {}", url, e);
            (format!("{}\tunknown", url), false)
        }
    }
}
