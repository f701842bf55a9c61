//! steamtool command-line entry point.
//!
//! Without a subcommand the interactive menu is started.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use steamtool::applist;
use steamtool::ctx::AppContext;
use steamtool::download::ManifestDownloader;
use steamtool::menu;
use steamtool::steam;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stop Steam, regenerate the AppList and start the injector
    Run,
    /// Download a manifest bundle and install its depot keys
    Download {
        /// AppID to fetch; prompted for when omitted
        app_id: Option<String>,
    },
    /// Install depot keys from an already downloaded bundle
    Apply {
        /// AppID of the bundle under utils/ManifestHub
        app_id: String,
    },
    /// Add an AppID to the list files
    Add { app_id: String },
    /// Show the registered AppIDs grouped by list file
    List,
    /// Remove an AppID from the list files
    Remove { app_id: String },
    /// Group list entries by resolved game name
    Organize,
    /// Run the bundled app-cache cleaner
    ClearCache,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let ctx = AppContext::new()?;

    match cli.command {
        None => menu::run(&ctx).await,
        Some(Commands::Run) => steam::launch(&ctx),
        Some(Commands::Download { app_id }) => {
            ManifestDownloader::new(&ctx)
                .await
                .run(app_id.as_deref())
                .await
        }
        Some(Commands::Apply { app_id }) => steam::install_keys(&ctx, &app_id).await,
        Some(Commands::Add { app_id }) => applist::add_app_id(&ctx, &app_id),
        Some(Commands::List) => {
            applist::show_app_ids(&ctx);
            Ok(())
        }
        Some(Commands::Remove { app_id }) => applist::remove_app_id(&ctx, &app_id),
        Some(Commands::Organize) => applist::organize(&ctx).await,
        Some(Commands::ClearCache) => steam::clear_cache(&ctx),
    }
}
