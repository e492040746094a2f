mod config;
mod mapper;
mod notion;
mod retry;
mod scryfall;
mod sync;

use std::io::{self, Write};
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};

use scryfall::Catalog;

#[derive(Parser)]
#[command(name = "mtg_sync", about = "Sync Scryfall card data into a Notion database")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync all sets, card by card, into the Notion database
    Sync {
        /// Resume from the most recently synced set (skips the prompt)
        #[arg(long, conflicts_with = "fresh")]
        resume: bool,
        /// Start from the first set (skips the prompt)
        #[arg(long)]
        fresh: bool,
        /// Only sync a single set, by set code (e.g. "woe")
        #[arg(short, long)]
        set: Option<String>,
    },
    /// List upstream sets in sync order
    Sets,
}

#[tokio::main]
async fn main() -> Result<()> {
    std::fs::create_dir_all("logs")?;
    let appender = tracing_appender::rolling::never("logs", "sync.log");
    let (writer, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync { resume, fresh, set } => {
            let cfg = config::from_env()?;
            let resume = if resume {
                true
            } else if fresh {
                false
            } else {
                prompt_resume()?
            };

            let catalog = scryfall::ScryfallClient::new()?;
            let store = notion::NotionClient::new(cfg.notion_token)?;
            let opts = sync::SyncOptions {
                resume,
                set_filter: set,
            };
            let stats = sync::run(&catalog, &store, &cfg.database_id, &opts).await?;
            println!(
                "Synced {} cards across {} sets ({} created, {} updated).",
                stats.cards, stats.sets, stats.created, stats.updated
            );
            Ok(())
        }
        Commands::Sets => {
            let catalog = scryfall::ScryfallClient::new()?;
            match catalog.sets().await? {
                Some(sets) => {
                    for s in &sets {
                        println!("{:<8} {}", s.code, s.name);
                    }
                    println!("\n{} sets", sets.len());
                }
                None => println!("Set listing unavailable."),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn prompt_resume() -> Result<bool> {
    print!("Do you want to continue from the last card synced in Notion? (yes/no): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "yes" || answer == "y")
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
