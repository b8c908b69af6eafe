use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use dstore::models::LocalFile;
use dstore::portal::{LinkOnly, Navigation, Navigator, SaveToDisk};
use dstore::{create_router, AppState, Config, Portal, Protocol, StoreClient};

#[derive(Debug, Parser)]
#[command(
    name = "dstore",
    version,
    about = "Upload, list, find and download files on a content-addressed store"
)]
struct Cli {
    /// Store protocol preset (overrides DSTORE_PROTOCOL)
    #[arg(long, global = true, value_enum)]
    protocol: Option<Protocol>,

    /// Store base URL (overrides DSTORE_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(long, global = true)]
    upload_path: Option<String>,

    /// Listing path; pass an empty string to disable listing
    #[arg(long, global = true)]
    list_path: Option<String>,

    /// Lookup path prefix; pass an empty string to disable lookups
    #[arg(long, global = true)]
    lookup_path: Option<String>,

    #[arg(long, global = true)]
    download_path: Option<String>,

    /// Give up on store requests after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the reference store node
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Upload a file
    Upload {
        /// Path to the file to upload
        file: Option<PathBuf>,
    },
    /// List the files the store holds
    List,
    /// Check whether the store holds an identifier
    Find {
        /// Content identifier (hash or CID)
        id: String,
    },
    /// Download a file by identifier
    Download {
        /// Content identifier (hash or CID)
        id: String,
        /// Directory to save into
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Print the download URL instead of fetching it
        #[arg(long)]
        print_url: bool,
    },
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        let client = &mut config.client;
        if let Some(protocol) = self.protocol {
            client.protocol = protocol;
        }
        if let Some(url) = &self.base_url {
            client.base_url = url.clone();
        }
        if self.upload_path.is_some() {
            client.upload_path = self.upload_path.clone();
        }
        if self.list_path.is_some() {
            client.list_path = self.list_path.clone();
        }
        if self.lookup_path.is_some() {
            client.lookup_path = self.lookup_path.clone();
        }
        if self.download_path.is_some() {
            client.download_path = self.download_path.clone();
        }
        if self.timeout_secs.is_some() {
            client.timeout_secs = self.timeout_secs;
        }

        if let Command::Serve {
            host,
            port,
            data_dir,
            chunk_size,
        } = &self.command
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(dir) = data_dir {
                config.store.data_dir = dir.clone();
            }
            if let Some(size) = chunk_size {
                config.store.chunk_size = *size;
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dstore::utils::init_logger();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    if let Command::Serve { .. } = cli.command {
        serve(config).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let client = StoreClient::new(config.client.options()?)?;
    info!(
        protocol = %client.protocol(),
        base_url = %client.options().base_url,
        "Store client ready"
    );

    let failed = match cli.command {
        Command::Serve { .. } => false,
        Command::Upload { file } => upload(Portal::new(client, LinkOnly), file).await,
        Command::List => {
            let view = Portal::new(client, LinkOnly).refresh_files().await;
            for row in view.rows() {
                println!("{row}");
            }
            view.is_failure()
        }
        Command::Find { id } => {
            let status = Portal::new(client, LinkOnly).search(&id).await;
            println!("{status}");
            status.is_failure()
        }
        Command::Download { id, out, print_url } => {
            if print_url {
                download(Portal::new(client, LinkOnly), &id).await
            } else {
                let navigator = SaveToDisk::new(client.clone(), out);
                download(Portal::new(client, navigator), &id).await
            }
        }
    };

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn upload<N: Navigator>(portal: Portal<N>, file: Option<PathBuf>) -> bool {
    let selected = match file {
        None => None,
        Some(path) => match LocalFile::read(&path).await {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read upload");
                println!("File not found: {}", path.display());
                return true;
            }
        },
    };

    let status = portal.upload(selected).await;
    println!("{status}");
    for row in portal.file_list().get().rows() {
        println!("  {row}");
    }
    status.is_failure()
}

async fn download<N: Navigator>(portal: Portal<N>, id: &str) -> bool {
    match portal.download(id).await {
        Ok(Navigation::Opened(url)) => {
            println!("{url}");
            false
        }
        Ok(Navigation::Saved(path)) => {
            println!("Downloaded {} to {}", id, path.display());
            false
        }
        Err(e) => {
            error!(error = %e, "Download failed");
            println!("Error downloading file.");
            true
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", config.server);

    let state = AppState::new(config.clone()).await?;
    let app = create_router(state);

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Node listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
