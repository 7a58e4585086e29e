//! Thin CLI surface over the Pixabay Hunter library.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use pixabay_hunter::{
    AppConfig, AppState, BatchController, BatchOptions, DownloadOutcome, SearchQuery,
    VideoDownloader, VideoItem,
};

/// Search Pixabay videos and download them in sequential batches
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search one page and print the result grid
    Search {
        term: String,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Download a single video by id from a searched page
    Download {
        term: String,

        /// Id of the video on the searched page
        id: u64,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Sequentially download every pending video, page by page
    Batch {
        term: String,

        /// Page to start from
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Seconds between two item downloads (defaults to the configured
        /// value)
        #[arg(long)]
        delay: Option<u64>,

        /// Stop after the starting page instead of auto-advancing
        #[arg(long)]
        no_auto_next: bool,
    },

    /// Manage the download history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// Write the history as a JSON array of ids
    Export { file: PathBuf },

    /// Union-merge a JSON array of ids into the history
    Import { file: PathBuf },

    /// Drop every recorded id
    Clear,

    /// Print how many videos are recorded
    Stats,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Store the Pixabay API key
    SetKey { key: String },

    /// Print the configuration and its location
    Show,
}

#[tokio::main]
async fn main() {
    pixabay_hunter::utils::logging::init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        // One message per failed operation, nothing stacked.
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Search { term, page } => {
            let mut state = AppState::new()?;
            let result = state.search.search(&SearchQuery::new(&term, page)).await?;
            let page_number = result.page_number;
            state.page_store.replace(result.items, page_number);

            if state.page_store.is_empty() {
                println!("No videos found for \"{term}\" on page {page_number}.");
                return Ok(());
            }

            print_page(
                state.page_store.current().items.as_slice(),
                &state.history,
            );
            println!(
                "\npage {page_number}, {} videos{}",
                state.page_store.len(),
                if state.page_store.has_likely_more_pages() {
                    ", more pages likely"
                } else {
                    ""
                }
            );
        }

        Command::Download { term, id, page } => {
            let mut state = AppState::new()?;
            let result = state.search.search(&SearchQuery::new(&term, page)).await?;
            let page_number = result.page_number;
            state.page_store.replace(result.items, page_number);

            let item = state
                .page_store
                .current()
                .items
                .iter()
                .find(|item| item.id == id)
                .cloned()
                .with_context(|| format!("video {id} is not on page {page_number}"))?;

            match state
                .downloader
                .download(&item, &mut state.history)
                .await?
            {
                DownloadOutcome::Saved { path } => {
                    println!("saved {}", path.display());
                }
                DownloadOutcome::Fallback { url } => {
                    println!("download failed; open the asset directly:\n{url}");
                }
            }
        }

        Command::Batch {
            term,
            page,
            delay,
            no_auto_next,
        } => {
            let mut state = AppState::new()?;

            let options = BatchOptions {
                item_delay: Duration::from_secs(
                    delay.unwrap_or(state.config.batch_delay_seconds),
                ),
                auto_next_page: !no_auto_next && state.config.auto_next_page,
                ..Default::default()
            };
            let controller = BatchController::new(options);

            let result = state.search.search(&SearchQuery::new(&term, page)).await?;
            if result.items.is_empty() {
                println!("No videos found for \"{term}\" on page {page}.");
                return Ok(());
            }
            let page_number = result.page_number;
            state.page_store.replace(result.items, page_number);

            // Ctrl-C requests a cooperative stop; the in-flight download is
            // left to finish.
            let stopper = controller.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    stopper.stop();
                }
            });

            let report = controller
                .run(
                    &term,
                    &mut state.page_store,
                    &mut state.history,
                    &state.downloader,
                    &state.search,
                )
                .await?;

            info!(
                downloaded = report.downloaded,
                failed = report.failed,
                "batch report ready"
            );
            println!(
                "{}: {} downloaded, {} fallbacks, {} failed across {} page(s)",
                if report.cancelled {
                    "batch stopped"
                } else {
                    "batch finished"
                },
                report.downloaded,
                report.fallbacks,
                report.failed,
                report.pages_visited
            );
            println!("history now records {} videos", state.history.len());
        }

        Command::History { action } => {
            let mut state = AppState::new()?;
            match action {
                HistoryAction::Export { file } => {
                    let json = state.history.export_json()?;
                    std::fs::write(&file, json)
                        .with_context(|| format!("failed to write {}", file.display()))?;
                    println!(
                        "exported {} ids to {}",
                        state.history.len(),
                        file.display()
                    );
                }
                HistoryAction::Import { file } => {
                    let payload = std::fs::read_to_string(&file)
                        .with_context(|| format!("failed to read {}", file.display()))?;
                    let added = state.history.import_json(&payload)?;
                    println!(
                        "imported {} new ids, history now records {}",
                        added,
                        state.history.len()
                    );
                }
                HistoryAction::Clear => {
                    state.history.clear()?;
                    println!("history cleared");
                }
                HistoryAction::Stats => {
                    println!(
                        "{} videos recorded in {}",
                        state.history.len(),
                        state.history.path().display()
                    );
                }
            }
        }

        Command::Config { action } => match action {
            ConfigAction::SetKey { key } => {
                let mut config = AppConfig::load()?;
                config.api_key = key;
                config.save()?;
                println!("API key stored");
            }
            ConfigAction::Show => {
                let config = AppConfig::load()?;
                println!("config file: {}", AppConfig::config_path()?.display());
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}

fn print_page(items: &[VideoItem], history: &pixabay_hunter::HistoryStore) {
    println!("{:>10}  {:>6}  {:>6}  {}", "id", "secs", "saved", "tags");
    for item in items {
        let best = item
            .videos
            .best()
            .map(|v| format!("{}x{}", v.width, v.height))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>10}  {:>6}  {:>6}  {} [{}]",
            item.id,
            item.duration,
            if history.contains(item.id) { "yes" } else { "" },
            item.tags,
            best
        );
    }
}
