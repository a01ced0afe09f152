use clap::Parser;
use plexport::api::account::PLEX_TV_URL;
use plexport::config::DEFAULT_CONFIG_PATH;
use plexport::driver::{self, RunOptions};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "plexport-cli")]
#[command(about = "Export Plex playlists to local storage", long_about = None)]
struct Cli {
    /// Configuration file (can also be set via PLEXPORT_CONFIG env var)
    #[arg(short, long, env = "PLEXPORT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print the raw server root response before connecting
    #[arg(long)]
    probe: bool,

    /// Account discovery endpoint
    #[arg(long, hide = true, default_value = PLEX_TV_URL)]
    account_url: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "plexport=info,info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let options = RunOptions {
        probe: cli.probe,
        account_url: cli.account_url,
    };

    // Errors are reported but never change the exit status.
    match driver::run(&cli.config, &options).await {
        Ok(summary) => {
            tracing::info!(
                "Done: {} files written, {} tracks failed, {} playlists skipped",
                summary.files_written(),
                summary.tracks_failed(),
                summary.skipped.len()
            );
        }
        Err(e) => eprintln!("An error occurred: {}", e),
    }
}
