use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devblog::config::{Config, DEFAULT_CONFIG_FILE};
use devblog::generate::build_site;
use devblog::server::router;
use devblog::state::AppState;
use devblog::{MarkdownRenderer, PostRepository};

#[derive(Parser)]
#[command(name = "devblog")]
#[command(about = "Serve or build a markdown blog")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the config file (defaults to ./blog.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the post files
    #[arg(long)]
    content_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the blog over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write the whole site as static files
    Build {
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    let path = cli
        .config
        .clone()
        .or_else(|| default_path.is_file().then_some(default_path));

    let mut config = Config::load(path.as_deref())?;
    config.apply_env()?;
    if let Some(dir) = &cli.content_dir {
        config.content_dir = dir.clone();
    }
    Ok(config)
}

async fn serve(config: Config) -> Result<()> {
    // An unreadable content directory is a startup failure, not a per-request one.
    let listing = PostRepository::new(&config.content_dir)
        .scan()
        .await
        .context("content directory check failed")?;
    info!(
        dir = %config.content_dir.display(),
        posts = listing.posts.len(),
        "Content directory ready"
    );
    for rejected in &listing.rejected {
        warn!(path = %rejected.path.display(), "Post excluded: {}", rejected.error);
    }

    let state = Arc::new(AppState::new(&config, Arc::new(MarkdownRenderer)));
    let app = router(state, config.static_dir.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "listening");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
        Commands::Build { output } => {
            if let Some(output) = output {
                config.output_dir = output;
            }
            let report = build_site(&config, &MarkdownRenderer).await?;
            info!(
                articles = report.articles,
                rejected = report.rejected,
                out = %config.output_dir.display(),
                "Build finished"
            );
            Ok(())
        }
    }
}
