use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    client::{ApiError, YouTubeClient},
    duration,
    resources::VideoSummary,
};

pub const WINDOW_DAYS: i64 = 30;
pub const DEFAULT_MIN_MINUTES: u32 = 3;
pub const DEFAULT_FETCH_COUNT: u32 = 50;
pub const DEFAULT_MONTHS: u32 = 6;
const DAYS_PER_MONTH: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewStatistics {
    pub videos_considered: usize,
    pub videos_matched: usize,
    pub total_views: u64,
}

impl ViewStatistics {
    /// Mean views of the matched videos, 0 when nothing matched.
    pub fn average(&self) -> f64 {
        if self.videos_matched == 0 {
            return 0.0;
        }
        self.total_views as f64 / self.videos_matched as f64
    }
}

impl fmt::Display for ViewStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} average views over {} of {} videos",
            self.average(),
            self.videos_matched,
            self.videos_considered
        )
    }
}

/// Tallies views of videos published within [`WINDOW_DAYS`] of `now` and at
/// least `min_minutes` long. A video without statistics counts as zero views.
pub fn summarize(videos: &[VideoSummary], min_minutes: u32, now: DateTime<Utc>) -> ViewStatistics {
    let cutoff = now - Duration::days(WINDOW_DAYS);
    let mut stats = ViewStatistics {
        videos_considered: videos.len(),
        ..Default::default()
    };

    for video in videos {
        if video.published_at < cutoff {
            continue;
        }
        if duration::minutes(video.duration()) < f64::from(min_minutes) {
            continue;
        }
        stats.videos_matched += 1;
        stats.total_views += video.view_count.unwrap_or(0);
    }

    stats
}

pub async fn view_statistics_last_30d(
    client: &YouTubeClient,
    identifier: &str,
    min_minutes: u32,
    fetch_count: u32,
) -> Result<ViewStatistics, ApiError> {
    let videos = client.fetch_videos(identifier, fetch_count).await?;
    let stats = summarize(&videos, min_minutes, Utc::now());
    debug!("{}: {}", identifier, stats);

    Ok(stats)
}

/// Average view count of the channel's videos from the last 30 days that are
/// longer than `min_minutes`. `fetch_count` bounds how many recent uploads
/// are looked at.
pub async fn avg_views_last_30d(
    client: &YouTubeClient,
    identifier: &str,
    min_minutes: u32,
    fetch_count: u32,
) -> Result<f64, ApiError> {
    view_statistics_last_30d(client, identifier, min_minutes, fetch_count)
        .await
        .map(|stats| stats.average())
}

/// Per-video numbers for one recent upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistic {
    pub video_id: String,
    pub published_at: DateTime<Utc>,
    pub duration_minutes: f64,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
}

impl From<&VideoSummary> for VideoStatistic {
    fn from(video: &VideoSummary) -> Self {
        Self {
            video_id: video.id.clone(),
            published_at: video.published_at,
            duration_minutes: duration::minutes(video.duration()),
            view_count: video.view_count,
            like_count: video.like_count,
            comment_count: video.comment_count,
        }
    }
}

/// Keeps videos published within `months` (of 30 days) before `now` that
/// run at least `min_minutes`, in input order, stopping after `max_results`.
pub fn recent_video_statistics(
    videos: &[VideoSummary],
    max_results: usize,
    months: u32,
    min_minutes: u32,
    now: DateTime<Utc>,
) -> Vec<VideoStatistic> {
    let cutoff = now - Duration::days(DAYS_PER_MONTH * i64::from(months));

    videos
        .iter()
        .filter(|v| v.published_at >= cutoff)
        .map(VideoStatistic::from)
        .filter(|s| s.duration_minutes >= f64::from(min_minutes))
        .take(max_results)
        .collect()
}

/// Statistics of up to `max_results` recent uploads. Twice as many uploads
/// are fetched so that short or old ones can be dropped.
pub async fn fetch_video_statistics(
    client: &YouTubeClient,
    identifier: &str,
    max_results: u32,
    months: u32,
    min_minutes: u32,
) -> Result<Vec<VideoStatistic>, ApiError> {
    let videos = client
        .fetch_videos(identifier, max_results.saturating_mul(2))
        .await?;
    let stats = recent_video_statistics(
        &videos,
        max_results as usize,
        months,
        min_minutes,
        Utc::now(),
    );
    debug!("{}: {} of {} videos kept", identifier, stats.len(), videos.len());

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, age_days: i64, duration: &str, views: Option<u64>, now: DateTime<Utc>) -> VideoSummary {
        VideoSummary {
            id: id.to_string(),
            title: id.to_string(),
            published_at: now - Duration::days(age_days),
            duration: Some(duration.to_string()),
            view_count: views,
            like_count: None,
            comment_count: None,
            thumbnails: None,
        }
    }

    #[test]
    fn average_of_recent_long_videos() {
        let now = Utc::now();
        let videos = vec![
            video("a", 1, "PT10M", Some(1000), now),
            video("b", 5, "PT4M", Some(3000), now),
            // too short
            video("c", 2, "PT59S", Some(1_000_000), now),
            // too old
            video("d", 31, "PT20M", Some(1_000_000), now),
        ];

        let stats = summarize(&videos, 3, now);
        assert_eq!(stats.videos_considered, 4);
        assert_eq!(stats.videos_matched, 2);
        assert_eq!(stats.total_views, 4000);
        assert_eq!(stats.average(), 2000.0);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let now = Utc::now();
        let videos = vec![video("a", 30, "PT3M", Some(10), now)];
        let stats = summarize(&videos, 3, now);
        assert_eq!(stats.videos_matched, 1);
    }

    #[test]
    fn missing_values_count_as_zero() {
        let now = Utc::now();
        let mut no_duration = video("a", 1, "", Some(500), now);
        no_duration.duration = None;
        let videos = vec![no_duration, video("b", 1, "PT5M", None, now)];

        let stats = summarize(&videos, 3, now);
        assert_eq!(stats.videos_matched, 1, "no duration means zero minutes");
        assert_eq!(stats.average(), 0.0);

        // Zero minimum lets the zero-length one through
        let stats = summarize(&videos, 0, now);
        assert_eq!(stats.videos_matched, 2);
        assert_eq!(stats.average(), 250.0);
    }

    #[test]
    fn per_video_statistics() {
        let now = Utc::now();
        let mut liked = video("a", 10, "PT10M30S", Some(100), now);
        liked.like_count = Some(7);
        let videos = vec![
            liked,
            // too short
            video("b", 20, "PT2M", Some(200), now),
            video("c", 100, "PT3M", None, now),
            // older than two months
            video("d", 61, "PT30M", Some(400), now),
            video("e", 40, "PT4M", Some(500), now),
        ];

        let stats = recent_video_statistics(&videos, 10, 2, 3, now);
        let ids: Vec<&str> = stats.iter().map(|s| s.video_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "e"]);
        assert_eq!(stats[0].duration_minutes, 10.5);
        assert_eq!(stats[0].like_count, Some(7));

        // Stops at max_results
        let stats = recent_video_statistics(&videos, 1, 2, 3, now);
        assert_eq!(stats.len(), 1);

        // A wider window lets the older one through
        let stats = recent_video_statistics(&videos, 10, 6, 3, now);
        let ids: Vec<&str> = stats.iter().map(|s| s.video_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d", "e"]);

        let value = serde_json::to_value(&stats[1]).unwrap();
        assert_eq!(value["videoId"], "c");
        assert_eq!(value["durationMinutes"], 3.0);
        assert!(value["viewCount"].is_null());
    }

    #[test]
    fn nothing_matches() {
        let stats = summarize(&[], 3, Utc::now());
        assert_eq!(stats.average(), 0.0);
        assert_eq!(stats.to_string(), "0.00 average views over 0 of 0 videos");
    }
}
