use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use yt_data_rs::{
    client::YouTubeClient,
    downloader,
    hubspot::{HubSpotClient, SyncSettings},
    stats,
};

#[derive(Parser)]
#[command(name = "yt-data-rs")]
#[command(about = "Query the YouTube Data API and download videos with yt-dlp")]
struct Cli {
    /// YouTube Data API key
    #[arg(long, env = "YT_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Channel snippet, statistics and content details
    Channel {
        /// Handle (@name), channel URL or channel ID
        identifier: String,
    },
    /// Recent uploads of a channel
    Videos {
        identifier: String,
        #[arg(short = 'n', long, default_value_t = 10)]
        max_results: u32,
    },
    /// Details of a single video
    Video { video_id: String },
    /// Details of several videos; unknown IDs are left out
    Details {
        #[arg(required = true)]
        video_ids: Vec<String>,
    },
    /// Search for channels
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(short = 'n', long, default_value_t = 10)]
        max_results: u32,
    },
    /// Search the uploads of one channel
    SearchVideos {
        /// Handle (@name), channel URL or channel ID
        identifier: String,
        #[arg(required = true)]
        term: Vec<String>,
        #[arg(short = 'n', long, default_value_t = 10)]
        max_results: u32,
    },
    /// Top-level comments of a video
    Comments {
        video_id: String,
        #[arg(short = 'n', long, default_value_t = 100)]
        max_results: u32,
    },
    /// Channel info together with its most recent uploads
    Introspect {
        identifier: String,
        #[arg(short = 'n', long, default_value_t = 10)]
        max_videos: u32,
    },
    /// Introspect the best match of a channel search
    SearchIntrospect {
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(short = 'n', long, default_value_t = 5)]
        max_videos: u32,
    },
    /// Per-video statistics of recent uploads
    VideoStats {
        identifier: String,
        #[arg(short = 'n', long, default_value_t = 10)]
        max_results: u32,
        /// Only uploads from the last N months
        #[arg(long, default_value_t = stats::DEFAULT_MONTHS)]
        months: u32,
        #[arg(long, default_value_t = stats::DEFAULT_MIN_MINUTES)]
        min_minutes: u32,
    },
    /// Average views over the last 30 days
    AvgViews {
        identifier: String,
        /// Ignore videos shorter than this
        #[arg(long, default_value_t = stats::DEFAULT_MIN_MINUTES)]
        min_minutes: u32,
        /// How many recent uploads to look at
        #[arg(long, default_value_t = stats::DEFAULT_FETCH_COUNT)]
        fetch_count: u32,
    },
    /// Download a video with yt-dlp
    Download {
        /// Video ID or URL
        video: String,
        #[arg(short, long, default_value = downloader::DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
        /// yt-dlp format selector
        #[arg(short, long, default_value = downloader::DEFAULT_QUALITY)]
        quality: String,
    },
    /// Refresh average views on stale HubSpot contacts
    HubspotSync {
        #[arg(long, default_value_t = 200)]
        limit: usize,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn youtube(api_key: Option<String>) -> Result<YouTubeClient> {
    Ok(match api_key {
        Some(key) => YouTubeClient::new(key)?.with_env_base_url(),
        None => YouTubeClient::from_env()?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Channel { identifier } => {
            let client = youtube(cli.api_key)?;
            print_json(&client.fetch_channel_info(&identifier).await?)?;
        }
        Command::Videos {
            identifier,
            max_results,
        } => {
            let client = youtube(cli.api_key)?;
            print_json(&client.fetch_videos(&identifier, max_results).await?)?;
        }
        Command::Video { video_id } => {
            let client = youtube(cli.api_key)?;
            print_json(&client.fetch_video_details(&video_id).await?)?;
        }
        Command::Details { video_ids } => {
            let client = youtube(cli.api_key)?;
            print_json(&client.fetch_videos_details(&video_ids).await?)?;
        }
        Command::Search { query, max_results } => {
            let client = youtube(cli.api_key)?;
            let query = query.join(" ");
            info!("Searching for channels matching '{}'", query);
            print_json(&client.search_channels(&query, max_results).await?)?;
        }
        Command::SearchVideos {
            identifier,
            term,
            max_results,
        } => {
            let client = youtube(cli.api_key)?;
            let term = term.join(" ");
            info!("Searching uploads of {} for '{}'", identifier, term);
            print_json(
                &client
                    .search_channel_videos(&identifier, &term, max_results)
                    .await?,
            )?;
        }
        Command::Comments {
            video_id,
            max_results,
        } => {
            let client = youtube(cli.api_key)?;
            print_json(&client.fetch_comments(&video_id, max_results).await?)?;
        }
        Command::Introspect {
            identifier,
            max_videos,
        } => {
            let client = youtube(cli.api_key)?;
            print_json(&client.introspect_channel(&identifier, max_videos).await?)?;
        }
        Command::SearchIntrospect { query, max_videos } => {
            let client = youtube(cli.api_key)?;
            let query = query.join(" ");
            print_json(
                &client
                    .search_and_introspect_channel(&query, max_videos)
                    .await?,
            )?;
        }
        Command::VideoStats {
            identifier,
            max_results,
            months,
            min_minutes,
        } => {
            let client = youtube(cli.api_key)?;
            let stats = stats::fetch_video_statistics(
                &client,
                &identifier,
                max_results,
                months,
                min_minutes,
            )
            .await?;
            print_json(&stats)?;
        }
        Command::AvgViews {
            identifier,
            min_minutes,
            fetch_count,
        } => {
            let client = youtube(cli.api_key)?;
            let stats =
                stats::view_statistics_last_30d(&client, &identifier, min_minutes, fetch_count)
                    .await?;
            println!(
                "Average views (last 30 days, >={}min): {:.2}",
                min_minutes,
                stats.average()
            );
            info!("{}", stats);
        }
        Command::Download {
            video,
            output,
            quality,
        } => {
            let dir = downloader::download_video(&video, &output, &quality).await?;
            println!("Downloaded to {}", dir.display());
        }
        Command::HubspotSync { limit } => {
            // Fail on missing HubSpot settings before touching the YouTube key
            let hubspot = HubSpotClient::from_env()?;
            let settings = SyncSettings::from_env()?;
            let client = youtube(cli.api_key)?;

            let report = hubspot.sync(&client, limit, &settings).await?;
            println!(
                "Found {}, updated {}, skipped {}, failed {}",
                report.found, report.updated, report.skipped, report.failed
            );
        }
    }

    Ok(())
}
