//! resource-shell
//!
//! Serves bundled pages, request dumps and static data to an embedded
//! browser, and rewrites network responses on their way in.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                 RESOURCE SHELL                 │
//!                    │                                                │
//!   Engine request   │  ┌──────────┐    ┌──────────────────────────┐  │
//!   ─────────────────┼─▶│   http   │───▶│  I/O thread              │  │
//!                    │  │ dev host │    │  ProviderChain           │  │
//!                    │  └────┬─────┘    │   pages → dump → data    │  │
//!                    │       │          └──────────────────────────┘  │
//!                    │       │ unclaimed                              │
//!                    │       ▼                                        │
//!                    │  ┌──────────┐    ┌──────────────────────────┐  │
//!                    │  │ upstream │───▶│  ResponseFilter          │──┼──▶ Engine
//!                    │  └──────────┘    │   replace rules, inject  │  │
//!                    │                  └────────────┬─────────────┘  │
//!                    │                               │ Injection       │
//!                    │                               ▼                 │
//!                    │                  ┌──────────────────────────┐  │
//!                    │                  │  UI task (ScriptSink)    │  │
//!                    │                  └──────────────────────────┘  │
//!                    └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use resource_shell::config::ShellConfig;
use resource_shell::domain;
use resource_shell::lifecycle::{self, signals, Shutdown};
use resource_shell::observability::{logging, metrics};
use resource_shell::providers::PageIndex;
use resource_shell::resource::ResourceRequest;
use resource_shell::runtime::{LoggingSink, UiContext};
use resource_shell::HttpServer;

#[derive(Parser)]
#[command(name = "resource-shell")]
#[command(about = "Local content resolution and response rewriting for a browser shell", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dev host
    Serve,
    /// Resolve one URL through the provider chain
    Resolve { url: String },
    /// Print the site key and injection script for a host
    SiteKey { host: String },
    /// List the bundled page index
    Index,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = lifecycle::load_or_default(cli.config.as_deref())?;
    logging::init_logging(&config.observability);
    lifecycle::finish_config(&mut config)?;

    tracing::info!(
        app_path = %config.content.app_path.display(),
        debug = config.content.debug,
        redirect_rules = config.rules.redirect.len(),
        replace_rules = config.rules.replace.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::Resolve { url } => resolve(&config, &url)?,
        Commands::SiteKey { host } => {
            let key = domain::site_key(&host);
            println!("site key: {key:?}");
            match domain::script_path(&config.content.pages_path(), &host) {
                Some(path) => println!("script:   {}", path.display()),
                None => println!("script:   none"),
            }
        }
        Commands::Index => {
            let index = PageIndex::build(&config.content.pages_path());
            for page in index.sorted() {
                println!("{page}");
            }
        }
    }

    Ok(())
}

async fn serve(config: ShellConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let (ui, injector) = UiContext::spawn(LoggingSink);
    let io = lifecycle::build_io_context(&config, injector).spawn()?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, io);
    let listener = server.bind().await?;
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;
    // The I/O thread exits once every IoHandle is gone, which closes the
    // injection channel.
    ui.join().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn resolve(config: &ShellConfig, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut chain = lifecycle::register_providers(config);
    let request = ResourceRequest::get(url)?;

    match chain.resolve(&request) {
        Some(response) => {
            println!("status: {} {}", response.status, response.status_text);
            println!("mime:   {}", response.mime_type);
            println!("bytes:  {}", response.body().len());
        }
        None => println!("not intercepted"),
    }
    Ok(())
}
