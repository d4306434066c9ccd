use clap::{Parser, ValueEnum};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infrascope_cache::SnapshotStore;
use infrascope_core::{
    Config, DiscoverOptions, DiscoveryEngine, Error, FilterSpec, GitHubSource, OutputFormat,
};

#[derive(Parser)]
#[command(name = "infrascope")]
#[command(version, about = "Discover and classify an organization's infrastructure repositories", long_about = None)]
struct Cli {
    /// Organization to discover (overrides the config file)
    #[arg(short, long)]
    org: Option<String>,

    /// Keep only records for this team
    #[arg(short, long)]
    team: Option<String>,

    /// Keep only records for this environment (dev, prod, global)
    #[arg(short, long, value_name = "ENV")]
    env: Option<String>,

    /// Keep only records for this resource
    #[arg(short, long)]
    resource: Option<String>,

    /// Output rendering
    #[arg(short, long, value_enum, default_value_t = FormatArg::Table)]
    format: FormatArg,

    /// Serve from the cached catalog only, stale or not - no network
    #[arg(long)]
    cached: bool,

    /// Refetch even if the cached catalog is still fresh
    #[arg(long)]
    refresh: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Table,
    List,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::List => OutputFormat::List,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Conventional signal exit code so wrapper scripts can tell an
    // interrupt apart from a failure. Snapshot writes are atomic, so an
    // interrupt can never leave a torn cache behind.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            process::exit(130);
        }
    });

    match run(cli).await {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("error: {}", err);
            if let Some(hint) = remediation(&err) {
                eprintln!("hint: {}", hint);
            }
            process::exit(exit_code(&err));
        }
    }
}

async fn run(cli: Cli) -> infrascope_core::Result<String> {
    let config = Config::load()?;

    let organization = cli
        .org
        .or_else(|| config.organization.clone())
        .ok_or_else(|| {
            Error::Config("no organization given, pass --org or set one in the config file".into())
        })?;

    let filter_spec = FilterSpec {
        team: cli.team,
        environment: cli.env.as_deref().map(str::parse).transpose()?,
        resource: cli.resource,
    };

    tracing::debug!("discovering repositories for {}", organization);

    let store = SnapshotStore::new(config.cache_path()?, config.cache_ttl());
    let options = DiscoverOptions {
        cache_only: cli.cached,
        force_refresh: cli.refresh,
    };

    let engine = if cli.cached {
        DiscoveryEngine::offline(store)
    } else {
        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| config.github.token.clone())
            .ok_or_else(|| {
                Error::AuthFailed("no credential found in GITHUB_TOKEN or the config file".into())
            })?;
        let source = GitHubSource::with_base_url(token, config.github.api_url.clone());
        DiscoveryEngine::new(Box::new(source), store)
    };

    engine
        .discover(&organization, &filter_spec, cli.format.into(), &options)
        .await
}

/// Logs go to stderr so list/json output on stdout stays pipeable
fn init_tracing(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// One exit code per failure kind so operator tooling can branch on $?
fn exit_code(err: &Error) -> i32 {
    match err {
        Error::AuthFailed(_) => 2,
        Error::RateLimited { .. } => 3,
        Error::Api(_) | Error::Network(_) => 4,
        Error::CacheMiss => 5,
        Error::InvalidFilter { .. } => 6,
        _ => 1,
    }
}

fn remediation(err: &Error) -> Option<&'static str> {
    match err {
        Error::AuthFailed(_) => {
            Some("export GITHUB_TOKEN with a fine-grained or classic personal access token")
        }
        Error::RateLimited { .. } => Some("wait for the reset instant shown above, then rerun"),
        Error::CacheMiss => Some("run once without --cached to build the catalog"),
        _ => None,
    }
}
