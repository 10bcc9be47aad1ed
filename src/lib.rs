//! # yt-data-rs
//!
//! A small wrapper around the [YouTube Data API v3] plus a helper that hands
//! video downloads off to [yt-dlp]. The crate does not try to be a complete
//! API binding: it covers channel lookup, upload listing, video details and
//! comments, and returns flattened records that are easy to print or
//! serialize.
//!
//! ## Usage
//!
//! ```no_run
//! use yt_data_rs::{client::YouTubeClient, downloader::{DownloadOptions, YtDlp}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads the API key from YT_API_KEY
//!     let client = YouTubeClient::from_env()?;
//!
//!     // Handles, channel URLs and channel IDs are all accepted
//!     let channel = client.fetch_channel_info("@veritasium").await?;
//!     println!("{} has {:?} subscribers", channel.title, channel.subscriber_count);
//!
//!     // Most recent uploads, enriched with duration and statistics
//!     let videos = client.fetch_videos(&channel.id, 3).await?;
//!
//!     // Download the newest one with yt-dlp
//!     if let Some(video) = videos.first() {
//!         YtDlp::new().download(&video.id, &DownloadOptions::default()).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! Every call is a single request (or a short, sequential chain of them for
//! pagination). Errors are returned as is; nothing is retried.
//!
//! [YouTube Data API v3]: https://developers.google.com/youtube/v3
//! [yt-dlp]: https://github.com/yt-dlp/yt-dlp

#[forbid(unsafe_code)]
#[macro_use]
extern crate log;

pub mod client;
pub mod config;
pub mod downloader;
pub mod duration;
pub mod hubspot;
pub mod resources;
pub mod stats;
pub mod util;
