use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_aux::prelude::*;

use crate::duration;

// Wire types, as returned by https://www.googleapis.com/youtube/v3. Only the
// fields we read are declared; serde ignores the rest.

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_results: Option<i64>,
    pub results_per_page: Option<i64>,
}

/// Keyed by size name: `default`, `medium`, `high`, ...
pub type Thumbnails = BTreeMap<String, Thumbnail>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: SearchResultId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    pub kind: String,
    pub channel_id: Option<String>,
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub snippet: Option<ChannelSnippet>,
    pub statistics: Option<ChannelStatistics>,
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub custom_url: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub subscriber_count: Option<u64>,
    #[serde(default)]
    pub hidden_subscriber_count: bool,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub video_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPlaylists {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub snippet: PlaylistItemSnippet,
    pub content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub title: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    pub video_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub snippet: Option<VideoSnippet>,
    pub content_details: Option<VideoContentDetails>,
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub published_at: Option<DateTime<Utc>>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContentDetails {
    pub duration: Option<String>,
    pub definition: Option<String>,
}

// Likes and comments are absent when the uploader disables them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub comment_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub author_display_name: Option<String>,
    pub text_display: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub like_count: Option<u64>,
    pub published_at: Option<DateTime<Utc>>,
}

// Records handed back to callers. They flatten the nested wire shape and
// serialize as camelCase JSON.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnails: Thumbnails,
    pub subscriber_count: Option<u64>,
    pub view_count: Option<u64>,
    pub video_count: Option<u64>,
    pub content_details: Option<ChannelContentDetails>,
}

impl From<Channel> for ChannelInfo {
    fn from(channel: Channel) -> Self {
        let (title, description, thumbnails) = match channel.snippet {
            Some(s) => (s.title, s.description, s.thumbnails),
            None => Default::default(),
        };
        let stats = channel.statistics;

        Self {
            id: channel.id,
            title,
            description,
            thumbnails,
            subscriber_count: stats
                .as_ref()
                .filter(|s| !s.hidden_subscriber_count)
                .and_then(|s| s.subscriber_count),
            view_count: stats.as_ref().and_then(|s| s.view_count),
            video_count: stats.as_ref().and_then(|s| s.video_count),
            content_details: channel.content_details,
        }
    }
}

impl ChannelInfo {
    pub fn uploads_playlist(&self) -> Option<&str> {
        self.content_details
            .as_ref()?
            .related_playlists
            .uploads
            .as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSearchResult {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnails: Thumbnails,
}

impl From<SearchResult> for ChannelSearchResult {
    fn from(result: SearchResult) -> Self {
        Self {
            id: result.id.channel_id.unwrap_or(result.snippet.channel_id),
            title: result.snippet.title,
            description: result.snippet.description,
            thumbnails: result.snippet.thumbnails,
        }
    }
}

/// A recent upload. Built from a playlist item, then filled in from the
/// matching `videos` resource when one comes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub duration: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub thumbnails: Option<Thumbnails>,
}

impl From<PlaylistItem> for VideoSummary {
    fn from(item: PlaylistItem) -> Self {
        Self {
            id: item.content_details.video_id,
            title: item.snippet.title,
            published_at: item.snippet.published_at,
            duration: None,
            view_count: None,
            like_count: None,
            comment_count: None,
            thumbnails: None,
        }
    }
}

impl VideoSummary {
    /// A `type=video` search hit. Hits without a video ID or publish time
    /// are not videos we can report on.
    pub fn from_search_hit(result: SearchResult) -> Option<Self> {
        Some(Self {
            id: result.id.video_id?,
            title: result.snippet.title,
            published_at: result.snippet.published_at?,
            duration: None,
            view_count: None,
            like_count: None,
            comment_count: None,
            thumbnails: None,
        })
    }

    pub fn enrich(&mut self, video: &Video) {
        self.duration = video
            .content_details
            .as_ref()
            .and_then(|c| c.duration.clone());
        if let Some(stats) = &video.statistics {
            self.view_count = stats.view_count;
            self.like_count = stats.like_count;
            self.comment_count = stats.comment_count;
        }
        self.thumbnails = video.snippet.as_ref().map(|s| s.thumbnails.clone());
    }

    /// Parsed duration; missing or odd values count as zero.
    pub fn duration(&self) -> Duration {
        self.duration
            .as_deref()
            .map(duration::parse_iso8601_duration)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub definition: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub thumbnails: Thumbnails,
}

impl From<Video> for VideoDetails {
    fn from(video: Video) -> Self {
        let snippet = video.snippet;
        let content = video.content_details;
        let stats = video.statistics;

        Self {
            id: video.id,
            title: snippet.as_ref().map(|s| s.title.clone()).unwrap_or_default(),
            description: snippet
                .as_ref()
                .map(|s| s.description.clone())
                .unwrap_or_default(),
            channel_id: snippet.as_ref().and_then(|s| s.channel_id.clone()),
            channel_title: snippet.as_ref().and_then(|s| s.channel_title.clone()),
            published_at: snippet.as_ref().and_then(|s| s.published_at),
            duration: content.as_ref().and_then(|c| c.duration.clone()),
            definition: content.and_then(|c| c.definition),
            view_count: stats.as_ref().and_then(|s| s.view_count),
            like_count: stats.as_ref().and_then(|s| s.like_count),
            comment_count: stats.as_ref().and_then(|s| s.comment_count),
            thumbnails: snippet.map(|s| s.thumbnails).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: Option<String>,
    pub text: Option<String>,
    pub like_count: Option<u64>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<CommentThread> for Comment {
    fn from(thread: CommentThread) -> Self {
        let snippet = thread.snippet.top_level_comment.snippet;
        Self {
            id: thread.id,
            author: snippet.author_display_name,
            text: snippet.text_display,
            like_count: snippet.like_count,
            published_at: snippet.published_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelIntrospection {
    pub channel: ChannelInfo,
    pub videos: Vec<VideoSummary>,
}
