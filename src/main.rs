use asb_portal::application::auth::password_digest;
use asb_portal::config::Config;
use asb_portal::domain::ports::{Mailer, PaymentGateway, Stores};
use asb_portal::infrastructure::disk::DiskFileStore;
use asb_portal::infrastructure::gateway::{HostedCheckoutGateway, SandboxGateway};
use asb_portal::infrastructure::in_memory;
use asb_portal::infrastructure::mailer::{HttpMailer, LogMailer};
use asb_portal::interfaces::http::{self, AppState};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Directory for uploaded files (overrides UPLOAD_DIR)
        #[arg(long)]
        upload_dir: Option<PathBuf>,
    },
    /// Print the digest to put in ADMIN_PASSWORD_SHA256
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::HashPassword { password } => {
            println!("{}", password_digest(&password));
            Ok(())
        }
        Command::Serve {
            port,
            db_path,
            upload_dir,
        } => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();

            let stores = open_stores(db_path)?;
            let mut config = Config::from_env().into_diagnostic()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(upload_dir) = upload_dir {
                config.upload_dir = upload_dir;
            }

            serve(config, stores).await
        }
    }
}

async fn serve(config: Config, stores: Stores) -> Result<()> {
    info!("Initializing state...");

    let gateway: Arc<dyn PaymentGateway> = match &config.gateway.api_key {
        Some(api_key) => Arc::new(
            HostedCheckoutGateway::new(&config.gateway.api_base, api_key).into_diagnostic()?,
        ),
        None => {
            warn!("GATEWAY_API_KEY not set, checkouts use the local sandbox");
            Arc::new(SandboxGateway::new(&config.public_url))
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.mail.api_url {
        Some(api_url) => Arc::new(
            HttpMailer::new(
                api_url,
                config.mail.api_key.clone().unwrap_or_default(),
                &config.mail.from,
            )
            .into_diagnostic()?,
        ),
        None => {
            warn!("MAIL_API_URL not set, emails are only logged");
            Arc::new(LogMailer)
        }
    };

    let files = DiskFileStore::open(&config.upload_dir)
        .await
        .into_diagnostic()?;

    let state = AppState::new(&config, stores, gateway, mailer, Arc::new(files));
    http::serve(state, config.port).await.into_diagnostic()
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    use asb_portal::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            info!(path = %path.display(), "Using RocksDB storage");
            Ok(RocksDBStore::open(path).into_diagnostic()?.stores())
        }
        None => Ok(in_memory::stores()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    if db_path.is_some() {
        eprintln!(
            "Warning: --db-path ignored, this build lacks the storage-rocksdb feature. Falling back to in-memory storage."
        );
    }
    Ok(in_memory::stores())
}
