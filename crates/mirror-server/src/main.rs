use mirror_core::http::Fetcher;
use mirror_core::kv::MemStore;
use mirror_pypi::cache::ProjectCache;
use mirror_pypi::changelog::ChangelogLoop;
use mirror_pypi::registry::MirrorRegistry;
use mirror_pypi::stage::{FileStore, Stage, StageConfig, StageOutcome};
use mirror_pypi::types::{Entry, ReleaseLink};
use mirror_pypi::xmlrpc_client::PypiXmlRpcClient;
use mirror_server::config::{MirrorConfig, MIRROR_VERSION_TAG};
use mirror_server::startup::prepare_stage_dir;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder file-store mapping: the real file-blob store (out of scope
/// for this crate) would download and content-address each link; this just
/// preserves the basename so the daemon is runnable standalone.
struct LocalFileStore;

impl FileStore for LocalFileStore {
    fn maplink(&self, link: &ReleaseLink) -> Entry {
        Entry {
            relpath: link.basename.clone(),
            digest: link.digest.clone(),
            keyname: link.basename.clone(),
        }
    }
}

fn print_help() {
    eprintln!("mirror-server {VERSION} - PyPI caching-mirror daemon");
    eprintln!();
    eprintln!("Usage: mirror-server [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --project NAME     Look up one project, print its release links, then exit");
    eprintln!("  --replica          Run in replica mode (fetches proxied through --master-url)");
    eprintln!("  --master-url URL   Primary node URL (replica mode)");
    eprintln!("  --basedir PATH     Directory for on-disk mirror state (default ./mirror-data)");
    eprintln!("  --refresh-secs N   Change-log poll interval in seconds (default 30)");
    eprintln!("  --version          Print version information");
    eprintln!("  --help             Print this help message");
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut config = MirrorConfig::default();
    let mut project: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--version" | "-V" => {
                println!("mirror-server {VERSION}");
                return;
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            "--replica" => config.replica.enabled = true,
            "--project" => {
                i += 1;
                project = args.get(i).cloned();
            }
            "--master-url" => {
                i += 1;
                config.replica.master_url = args.get(i).cloned();
            }
            "--basedir" => {
                i += 1;
                if let Some(v) = args.get(i) {
                    config.basedir = v.clone();
                }
            }
            "--refresh-secs" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse().ok()) {
                    config.refresh_interval_secs = v;
                }
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown option: {other}");
                eprintln!("Run 'mirror-server --help' for usage information.");
                std::process::exit(1);
            }
            _ => {}
        }
        i += 1;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting mirror-server v{VERSION}");

    let basedir = PathBuf::from(&config.basedir);
    let stage_dir = match prepare_stage_dir(&basedir, &config.stage_name, MIRROR_VERSION_TAG) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!(error = %e, "failed to prepare stage directory");
            std::process::exit(1);
        }
    };
    let registry_path = stage_dir.join(".name2serials");

    let xmlrpc_endpoint = format!("{}pypi", config.pypi_base_url);
    let xmlrpc_client = Arc::new(PypiXmlRpcClient::new(xmlrpc_endpoint));

    let registry = match MirrorRegistry::bootstrap(&*xmlrpc_client, &registry_path).await {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            tracing::error!(error = %e, "mirror bootstrap failed");
            std::process::exit(1);
        }
    };

    let store = Arc::new(MemStore::new());

    let changelog_loop = Arc::new(ChangelogLoop::new(
        registry.clone(),
        Arc::new(ProjectCache::new(store.clone())),
        xmlrpc_client,
        registry_path,
        Duration::from_secs(config.refresh_interval_secs),
    ));
    let (handle, shutdown_tx) = changelog_loop.spawn();

    let base_simple_url = if config.replica.enabled {
        config
            .replica
            .master_url
            .clone()
            .unwrap_or_else(|| config.pypi_base_url.clone())
    } else {
        config.pypi_base_url.clone()
    };

    let stage = Stage::new(
        registry,
        store,
        Fetcher::new(),
        LocalFileStore,
        StageConfig {
            base_simple_url,
            is_replica: config.replica.enabled,
        },
    );

    if let Some(name) = project {
        match stage.getreleaselinks(&name).await {
            StageOutcome::Entries(entries) => match serde_json::to_string_pretty(&entries) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "failed to serialize entries"),
            },
            other => eprintln!("{other:?}"),
        }
        let _ = shutdown_tx.send(());
        let _ = handle.await;
        return;
    }

    tokio::signal::ctrl_c().await.ok();
    tracing::info!("shutting down");
    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
