use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::{
    config::{self, ConfigError},
    resources::{
        Channel, ChannelInfo, ChannelIntrospection, ChannelSearchResult, Comment, CommentThread,
        ListResponse, PlaylistItem, SearchResult, Video, VideoDetails, VideoSummary,
    },
    util::{HttpClient, HttpError},
};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

// Hard limits of the API for a single page
const MAX_PAGE_SIZE: u32 = 50;
const MAX_COMMENT_PAGE_SIZE: u32 = 100;

const VIDEO_PARTS: &str = "snippet,contentDetails,statistics";

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("channel not found for identifier: {0}")]
    ChannelNotFound(String),
    #[error("video not found: {0}")]
    VideoNotFound(String),
    #[error("No channel found for query: {0}")]
    NoChannelMatch(String),
}

/// Minimal YouTube Data API v3 client authenticated with an API key.
pub struct YouTubeClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        let api_key =
            config::non_empty(Some(api_key.into())).ok_or(ConfigError::MissingApiKey)?;
        let http = HttpClient::new().map_err(HttpError::from)?;

        Ok(Self {
            http,
            api_key,
            base_url: YOUTUBE_API_BASE.to_string(),
        })
    }

    /// Builds a client from `YT_API_KEY`, honouring `YT_API_BASE_URL` if set.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(config::api_key_from_env()?)?.with_env_base_url())
    }

    /// Points the client at `YT_API_BASE_URL` when it is set.
    pub fn with_env_base_url(self) -> Self {
        match config::var(config::API_BASE_URL_VAR) {
            Some(base) => self.with_base_url(base),
            None => self,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} {:?}", url, params);

        let request = self
            .http
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())]);

        Ok(self.http.send_json(request).await?)
    }

    /// Resolves a handle, channel URL or channel ID to the canonical channel
    /// ID. Only falls back to a search request when the identifier is not
    /// already an ID.
    pub async fn resolve_channel_id(&self, identifier: &str) -> Result<String, ApiError> {
        let identifier = identifier.trim();
        if let Some(id) = channel_id_shortcut(identifier) {
            return Ok(id.to_string());
        }

        let query = search_term(identifier);
        let data: ListResponse<SearchResult> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "channel"),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        let id = data
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet.channel_id)
            .ok_or_else(|| ApiError::ChannelNotFound(query.to_string()))?;
        debug!("Resolved {} to {}", identifier, id);

        Ok(id)
    }

    /// Fetches snippet, statistics and content details of a channel.
    pub async fn fetch_channel_info(&self, identifier: &str) -> Result<ChannelInfo, ApiError> {
        let channel_id = self.resolve_channel_id(identifier).await?;
        let data: ListResponse<Channel> = self
            .get(
                "channels",
                &[
                    ("part", "snippet,statistics,contentDetails"),
                    ("id", channel_id.as_str()),
                ],
            )
            .await?;

        data.items
            .into_iter()
            .next()
            .map(ChannelInfo::from)
            .ok_or(ApiError::ChannelNotFound(channel_id))
    }

    pub async fn search_channels(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<ChannelSearchResult>, ApiError> {
        let max_results = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let data: ListResponse<SearchResult> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "channel"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        Ok(data
            .items
            .into_iter()
            .map(ChannelSearchResult::from)
            .collect())
    }

    /// Returns up to `max_results` recent uploads of a channel, newest first,
    /// with duration and statistics filled in.
    pub async fn fetch_videos(
        &self,
        identifier: &str,
        max_results: u32,
    ) -> Result<Vec<VideoSummary>, ApiError> {
        let channel_id = self.resolve_channel_id(identifier).await?;
        let data: ListResponse<Channel> = self
            .get("channels", &[("part", "contentDetails"), ("id", channel_id.as_str())])
            .await?;

        let uploads = data
            .items
            .into_iter()
            .next()
            .map(ChannelInfo::from)
            .and_then(|info| info.uploads_playlist().map(str::to_string));
        let Some(uploads) = uploads else {
            debug!("Channel {} has no uploads playlist", channel_id);
            return Ok(Vec::new());
        };

        let mut videos: Vec<VideoSummary> = Vec::new();
        let mut page_token: Option<String> = None;
        while (videos.len() as u32) < max_results {
            let page_size = (max_results - videos.len() as u32)
                .min(MAX_PAGE_SIZE)
                .to_string();
            let mut params = vec![
                ("part", "snippet,contentDetails"),
                ("playlistId", uploads.as_str()),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.as_str()));
            }

            let page: ListResponse<PlaylistItem> = self.get("playlistItems", &params).await?;
            videos.extend(page.items.into_iter().map(VideoSummary::from));

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        videos.truncate(max_results as usize);

        self.enrich_videos(&mut videos).await?;
        Ok(videos)
    }

    /// Searches the uploads of one channel for `term`. Hits are filled in
    /// from a single `videos` call; hits that call does not return keep
    /// their basic fields.
    pub async fn search_channel_videos(
        &self,
        identifier: &str,
        term: &str,
        max_results: u32,
    ) -> Result<Vec<VideoSummary>, ApiError> {
        let channel_id = self.resolve_channel_id(identifier).await?;
        let max_results = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let data: ListResponse<SearchResult> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id.as_str()),
                    ("q", term),
                    ("type", "video"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        let mut videos: Vec<VideoSummary> = data
            .items
            .into_iter()
            .filter_map(VideoSummary::from_search_hit)
            .collect();
        debug!("{} videos of {} match '{}'", videos.len(), channel_id, term);

        self.enrich_videos(&mut videos).await?;
        Ok(videos)
    }

    async fn enrich_videos(&self, videos: &mut [VideoSummary]) -> Result<(), ApiError> {
        if videos.is_empty() {
            return Ok(());
        }

        let ids: Vec<&str> = videos.iter().map(|v| v.id.as_str()).collect();
        let details: HashMap<String, Video> = self
            .fetch_raw_videos(&ids)
            .await?
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect();

        for video in videos.iter_mut() {
            if let Some(d) = details.get(&video.id) {
                video.enrich(d);
            }
        }

        Ok(())
    }

    /// Fetches one video. Unlike [`YouTubeClient::fetch_videos_details`], an
    /// unknown ID is an error.
    pub async fn fetch_video_details(&self, video_id: &str) -> Result<VideoDetails, ApiError> {
        self.fetch_raw_videos(&[video_id])
            .await?
            .into_iter()
            .next()
            .map(VideoDetails::from)
            .ok_or_else(|| ApiError::VideoNotFound(video_id.to_string()))
    }

    /// Fetches several videos. IDs the API does not know are left out of the
    /// result, so it may be shorter than the input.
    pub async fn fetch_videos_details<S>(&self, video_ids: &[S]) -> Result<Vec<VideoDetails>, ApiError>
    where
        S: AsRef<str>,
    {
        let ids: Vec<&str> = video_ids.iter().map(|s| s.as_ref()).collect();
        Ok(self
            .fetch_raw_videos(&ids)
            .await?
            .into_iter()
            .map(VideoDetails::from)
            .collect())
    }

    async fn fetch_raw_videos(&self, ids: &[&str]) -> Result<Vec<Video>, ApiError> {
        let mut videos = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_PAGE_SIZE as usize) {
            let joined = chunk.join(",");
            let data: ListResponse<Video> = self
                .get("videos", &[("part", VIDEO_PARTS), ("id", joined.as_str())])
                .await?;
            videos.extend(data.items);
        }

        Ok(videos)
    }

    /// Returns top-level comments of a video, most relevant first.
    pub async fn fetch_comments(
        &self,
        video_id: &str,
        max_results: u32,
    ) -> Result<Vec<Comment>, ApiError> {
        let mut comments: Vec<Comment> = Vec::new();
        let mut page_token: Option<String> = None;
        while (comments.len() as u32) < max_results {
            let page_size = (max_results - comments.len() as u32)
                .min(MAX_COMMENT_PAGE_SIZE)
                .to_string();
            let mut params = vec![
                ("part", "snippet"),
                ("videoId", video_id),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.as_str()));
            }

            let page: ListResponse<CommentThread> = self.get("commentThreads", &params).await?;
            comments.extend(page.items.into_iter().map(Comment::from));

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        comments.truncate(max_results as usize);

        Ok(comments)
    }

    /// Channel info together with its most recent uploads.
    pub async fn introspect_channel(
        &self,
        identifier: &str,
        max_videos: u32,
    ) -> Result<ChannelIntrospection, ApiError> {
        let channel = self.fetch_channel_info(identifier).await?;
        let videos = self.fetch_videos(&channel.id, max_videos).await?;

        Ok(ChannelIntrospection { channel, videos })
    }

    /// Introspects the top hit of a channel search.
    pub async fn search_and_introspect_channel(
        &self,
        query: &str,
        max_videos: u32,
    ) -> Result<ChannelIntrospection, ApiError> {
        let hit = self
            .search_channels(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NoChannelMatch(query.to_string()))?;
        info!("'{}' matched channel {} ({})", query, hit.title, hit.id);

        self.introspect_channel(&hit.id, max_videos).await
    }
}

fn is_channel_id(value: &str) -> bool {
    value.starts_with("UC") && value.len() > 20
}

/// Channel IDs that can be read straight off the identifier.
fn channel_id_shortcut(identifier: &str) -> Option<&str> {
    if is_channel_id(identifier) {
        return Some(identifier);
    }
    if identifier.starts_with("http") {
        let last = last_path_segment(identifier);
        if last.starts_with("UC") {
            return Some(last);
        }
    }
    None
}

fn search_term(identifier: &str) -> &str {
    if identifier.starts_with("http") {
        last_path_segment(identifier)
    } else {
        identifier
    }
}

fn last_path_segment(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}
