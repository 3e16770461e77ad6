//! Gateway Resolver - CLI Entry Point
//!
//! - `resolve`: read a gateways file, resolve it, write output documents
//! - `serve`: answer resolution requests over HTTP

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use gateway_resolver::config::LookupBackend;
use gateway_resolver::render::FormatSelection;
use gateway_resolver::{App, Config, VERSION};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gateway-resolver")]
#[command(version = VERSION)]
#[command(about = "Resolve VPN gateway hostnames to IP addresses")]
struct Args {
    /// Path to configuration file
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a gateways file and write output files
    Resolve(ResolveArgs),
    /// Serve the resolution endpoint over HTTP
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
struct ResolveArgs {
    /// Input file with gateway hostnames (default: gateways.txt)
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Output directory for generated files (default: output)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Output format (default: all)
    #[arg(long = "format", value_enum)]
    format: Option<FormatSelection>,

    #[command(flatten)]
    resolver: ResolverArgs,
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Listen address
    #[arg(long = "listen")]
    listen: Option<String>,

    /// Access key required on resolution requests
    #[arg(long = "secret")]
    secret: Option<String>,

    /// Default GitHub owner of the gateway list
    #[arg(long = "owner")]
    owner: Option<String>,

    /// Default GitHub repository of the gateway list
    #[arg(long = "repo")]
    repo: Option<String>,

    #[command(flatten)]
    resolver: ResolverArgs,
}

#[derive(clap::Args, Debug)]
struct ResolverArgs {
    /// Max concurrent DNS lookups (default: 20)
    #[arg(long = "workers")]
    workers: Option<usize>,

    /// Per-lookup timeout in milliseconds
    #[arg(long = "lookup-timeout-ms")]
    lookup_timeout_ms: Option<u64>,

    /// Name-resolution backend
    #[arg(long = "backend", value_enum)]
    backend: Option<LookupBackend>,
}

impl ResolverArgs {
    fn apply(self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.resolver.workers = workers;
        }
        if let Some(timeout) = self.lookup_timeout_ms {
            config.resolver.lookup_timeout_ms = Some(timeout);
        }
        if let Some(backend) = self.backend {
            config.resolver.backend = backend;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get().max(2))
        .max_blocking_threads(32)
        .enable_all()
        .thread_name("resolver-worker")
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => match Config::load_async(path).await {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("gateway_resolver={}", config.log_level()).parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Gateway Resolver v{}", VERSION);

    match args.command {
        Command::Resolve(resolve) => {
            if let Some(input) = resolve.input {
                config.output.input = input;
            }
            if let Some(dir) = resolve.output_dir {
                config.output.dir = dir;
            }
            if let Some(format) = resolve.format {
                config.output.formats = vec![format];
            }
            resolve.resolver.apply(&mut config);

            if !config.output.input.exists() {
                error!("Input file '{}' not found", config.output.input.display());
                std::process::exit(1);
            }

            let app = build_app(config);
            if let Err(e) = app.run_batch().await {
                error!("Batch resolution failed: {}", e);
                std::process::exit(1);
            }
        }
        Command::Serve(serve) => {
            if let Some(listen) = serve.listen {
                config.server.listen = listen;
            }
            if let Some(secret) = serve.secret {
                config.server.secret = Some(secret);
            }
            if let Some(owner) = serve.owner {
                config.server.owner = owner;
            }
            if let Some(repo) = serve.repo {
                config.server.repo = repo;
            }
            serve.resolver.apply(&mut config);

            let app = build_app(config);
            if let Err(e) = app.serve().await {
                error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn build_app(config: Config) -> App {
    match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    }
}
