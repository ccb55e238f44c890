use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use reportbox_artifact::{FsStore, Store, Upload};
use reportbox_config::Config;
use reportbox_http::AppState;

/// Reportbox - store and retrieve report archives by identifier
#[derive(Parser)]
#[command(name = "reportbox")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to a JSON config file (default: <config dir>/reportbox/config.json, if present)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Directory holding stored archives (overrides the config file)
  #[arg(long, global = true)]
  root: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the HTTP server
  Serve {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Largest accepted request body, in bytes
    #[arg(long)]
    max_upload_bytes: Option<usize>,
  },

  /// Store an archive under a report identifier
  Store {
    report_id: String,

    /// Path to the archive
    file: PathBuf,

    /// Declared media type of the archive
    #[arg(long)]
    content_type: Option<String>,
  },

  /// Retrieve the archive stored under a report identifier
  Fetch {
    report_id: String,

    /// Output path (default: the stored file name, in the current directory)
    #[arg(long)]
    out: Option<PathBuf>,
  },

  /// List every archive stored under a report identifier
  List { report_id: String },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let mut config = load_config(cli.config.as_deref())?;
  if let Some(root) = cli.root {
    config.store.root = root;
  }

  let rt = tokio::runtime::Runtime::new()?;

  match cli.command {
    Some(Commands::Serve {
      bind,
      max_upload_bytes,
    }) => {
      if let Some(bind) = bind {
        config.server.bind = bind;
      }
      if let Some(max) = max_upload_bytes {
        config.server.max_upload_bytes = max;
      }
      rt.block_on(serve(config))?;
    }
    Some(Commands::Store {
      report_id,
      file,
      content_type,
    }) => {
      rt.block_on(store_file(&config, report_id, file, content_type))?;
    }
    Some(Commands::Fetch { report_id, out }) => {
      rt.block_on(fetch_file(&config, report_id, out))?;
    }
    Some(Commands::List { report_id }) => {
      rt.block_on(list_files(&config, report_id))?;
    }
    None => {
      println!("reportbox - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
  if let Some(path) = path {
    return Config::load(path)
      .with_context(|| format!("failed to load config: {}", path.display()));
  }

  match dirs::config_dir().map(|d| d.join("reportbox").join("config.json")) {
    Some(default_path) if default_path.is_file() => Config::load(&default_path)
      .with_context(|| format!("failed to load config: {}", default_path.display())),
    _ => Ok(Config::default()),
  }
}

fn open_store(config: &Config) -> FsStore {
  FsStore::new(&config.store.root).with_policy(config.store.policy())
}

async fn serve(config: Config) -> Result<()> {
  let store = open_store(&config);
  tracing::info!(root = %store.root().display(), "using storage root");

  let app = reportbox_http::app(AppState::new(store), config.server.max_upload_bytes);

  let cancel = CancellationToken::new();
  let signal = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      tracing::info!("shutdown requested");
    }
    signal.cancel();
  });

  reportbox_http::serve(config.server.bind, app, cancel.cancelled_owned())
    .await
    .with_context(|| format!("server failed on {}", config.server.bind))
}

async fn store_file(
  config: &Config,
  report_id: String,
  file: PathBuf,
  content_type: Option<String>,
) -> Result<()> {
  let content = tokio::fs::read(&file)
    .await
    .with_context(|| format!("failed to read archive: {}", file.display()))?;

  let mut upload = Upload::new(report_id, content);
  upload.filename = file
    .file_name()
    .map(|name| name.to_string_lossy().into_owned());
  upload.content_type = content_type;

  let stored = open_store(config)
    .put(upload)
    .await
    .context("failed to store archive")?;

  println!("{}", stored.path.display());
  Ok(())
}

async fn fetch_file(config: &Config, report_id: String, out: Option<PathBuf>) -> Result<()> {
  let artifact = open_store(config)
    .get(&report_id)
    .await
    .with_context(|| format!("failed to fetch archive for '{report_id}'"))?;

  let out = out.unwrap_or_else(|| PathBuf::from(&artifact.filename));
  tokio::fs::write(&out, &artifact.content)
    .await
    .with_context(|| format!("failed to write archive: {}", out.display()))?;

  eprintln!("Wrote {} ({} bytes)", out.display(), artifact.size);
  Ok(())
}

async fn list_files(config: &Config, report_id: String) -> Result<()> {
  let names = open_store(config)
    .list(&report_id)
    .await
    .with_context(|| format!("failed to list archives for '{report_id}'"))?;

  println!("{}", serde_json::to_string_pretty(&names)?);
  Ok(())
}
