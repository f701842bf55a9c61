//! Interactive console menu.
//!
//! Started when the binary runs without a subcommand. Every entry maps
//! to one subcommand; an empty input launches Steam, which is the common
//! case after a batch of downloads.

use std::io::Write;

use anyhow::Result;
use colored::Colorize;

use crate::applist;
use crate::ctx::AppContext;
use crate::download::ManifestDownloader;
use crate::steam;

const BANNER: &str = r"
      _                       _              _
  ___| |_ ___  __ _ _ __ ___ | |_ ___   ___ | |
 / __| __/ _ \/ _` | '_ ` _ \| __/ _ \ / _ \| |
 \__ \ ||  __/ (_| | | | | | | || (_) | (_) | |
 |___/\__\___|\__,_|_| |_| |_|\__\___/ \___/|_|
";

/// Runs the menu loop until the user exits.
pub async fn run(ctx: &AppContext) -> Result<()> {
    println!("{}", BANNER.cyan());

    loop {
        println!();
        println!("  {} Launch Steam", "1.".bold());
        println!("  {} Download manifests", "2.".bold());
        println!("  {} Add AppID", "3.".bold());
        println!("  {} Organize lists", "4.".bold());
        println!("  {} Show AppIDs", "5.".bold());
        println!("  {} Remove AppID", "6.".bold());
        println!("  {} Clear app cache", "7.".bold());
        println!("  {} Exit", "0.".bold());
        println!();

        let choice = read_line("Select (Enter = 1): ")?;
        let result = match choice.as_str() {
            "" | "1" => steam::launch(ctx),
            "2" => ManifestDownloader::new(ctx).await.run(None).await,
            "3" => {
                let app_id = read_line("AppID to add: ")?;
                applist::add_app_id(ctx, &app_id)
            }
            "4" => applist::organize(ctx).await,
            "5" => {
                applist::show_app_ids(ctx);
                Ok(())
            }
            "6" => {
                let app_id = read_line("AppID to remove: ")?;
                applist::remove_app_id(ctx, &app_id)
            }
            "7" => steam::clear_cache(ctx),
            "0" | "q" | "exit" => return Ok(()),
            other => {
                println!("❓ unknown choice: {other}");
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("{} {e:#}", "❌".red());
        }
        wait_for_enter()?;
    }
}

/// Prompts and reads one trimmed line from stdin.
fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt.bold());
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Pauses until the user presses Enter.
fn wait_for_enter() -> Result<()> {
    print!("{}", "Press Enter to continue...".dimmed());
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(())
}
