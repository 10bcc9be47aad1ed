//! In-process stand-in for the YouTube Data API, served with axum on a random
//! local port. Every request is recorded so tests can assert on what was
//! sent.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

pub const API_KEY: &str = "ABC123";
pub const CHANNEL_ID: &str = "UC_x5XG1OV2P6uZZ5FSM9Ttw";
pub const CHANNEL_TITLE: &str = "Google for Developers";
pub const UPLOADS_PLAYLIST: &str = "UU_x5XG1OV2P6uZZ5FSM9Ttw";
pub const EMPTY_CHANNEL_ID: &str = "UCemptyemptyemptyempty00";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub params: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct MockState {
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockState {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    fn record(&self, path: &str, params: &HashMap<String, String>) {
        self.requests.lock().unwrap().push(Recorded {
            path: path.to_string(),
            params: params.clone(),
        });
    }
}

fn google_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": message,
                "errors": [{"message": message, "domain": "global", "reason": "badRequest"}]
            }
        })),
    )
}

fn check_key(params: &HashMap<String, String>) -> Result<(), (StatusCode, Json<Value>)> {
    match params.get("key").map(String::as_str) {
        Some(API_KEY) => Ok(()),
        _ => Err(google_error(
            StatusCode::BAD_REQUEST,
            "API key not valid. Please pass a valid API key.",
        )),
    }
}

fn list(kind: &str, items: Vec<Value>, next_page_token: Option<&str>) -> Json<Value> {
    let mut body = json!({
        "kind": kind,
        "etag": "etag",
        "pageInfo": {"totalResults": items.len(), "resultsPerPage": items.len()},
        "items": items,
    });
    if let Some(token) = next_page_token {
        body["nextPageToken"] = json!(token);
    }
    Json(body)
}

async fn search(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record("search", &params);
    if let Err(e) = check_key(&params) {
        return e.into_response();
    }

    let query = params.get("q").cloned().unwrap_or_default();
    let items = if params.get("type").map(String::as_str) == Some("video") {
        video_hits(params.get("channelId").map(String::as_str), &query)
    } else {
        channel_hits(&query)
    };

    let max: usize = params
        .get("maxResults")
        .and_then(|m| m.parse().ok())
        .unwrap_or(5);
    let items: Vec<Value> = items.into_iter().take(max).collect();

    list("youtube#searchListResponse", items, None).into_response()
}

fn channel_hits(query: &str) -> Vec<Value> {
    match query {
        "@googledevelopers" | "GoogleDevelopers" | "google" => vec![
            json!({
                "kind": "youtube#searchResult",
                "id": {"kind": "youtube#channel", "channelId": CHANNEL_ID},
                "snippet": {
                    "channelId": CHANNEL_ID,
                    "title": CHANNEL_TITLE,
                    "description": "Subscribe to join a community of creative developers",
                    "thumbnails": {"default": {"url": "https://yt3.ggpht.com/a.jpg"}}
                }
            }),
            json!({
                "kind": "youtube#searchResult",
                "id": {"kind": "youtube#channel", "channelId": "UCVHFbqXqoYvEWM1Ddxl0QDg"},
                "snippet": {
                    "channelId": "UCVHFbqXqoYvEWM1Ddxl0QDg",
                    "title": "Android Developers",
                    "description": ""
                }
            }),
        ],
        _ => vec![],
    }
}

/// "release" matches vid1 and a hit the videos endpoint does not know.
fn video_hits(channel_id: Option<&str>, query: &str) -> Vec<Value> {
    let hit = |id: &str, title: &str| {
        json!({
            "kind": "youtube#searchResult",
            "id": {"kind": "youtube#video", "videoId": id},
            "snippet": {
                "channelId": CHANNEL_ID,
                "title": title,
                "publishedAt": "2024-03-01T12:00:00Z"
            }
        })
    };

    match (channel_id, query) {
        (Some(CHANNEL_ID), "release") => vec![
            hit("vid1", "Recent and long"),
            hit("ghost", "Removed after indexing"),
        ],
        _ => vec![],
    }
}

async fn channels(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record("channels", &params);
    if let Err(e) = check_key(&params) {
        return e.into_response();
    }

    let items = match params.get("id").map(String::as_str) {
        Some(CHANNEL_ID) => vec![json!({
            "kind": "youtube#channel",
            "id": CHANNEL_ID,
            "snippet": {
                "title": CHANNEL_TITLE,
                "description": "Subscribe to join a community of creative developers",
                "customUrl": "@googledevelopers"
            },
            "contentDetails": {"relatedPlaylists": {"likes": "", "uploads": UPLOADS_PLAYLIST}},
            "statistics": {
                "viewCount": "268345111",
                "subscriberCount": "2470000",
                "hiddenSubscriberCount": false,
                "videoCount": "6335"
            }
        })],
        Some(EMPTY_CHANNEL_ID) => vec![json!({
            "kind": "youtube#channel",
            "id": EMPTY_CHANNEL_ID,
            "snippet": {"title": "Nothing here"},
            "contentDetails": {"relatedPlaylists": {}}
        })],
        _ => vec![],
    };

    list("youtube#channelListResponse", items, None).into_response()
}

/// Uploads: vid1, vid2 on the first page, vid3 on the second.
async fn playlist_items(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record("playlistItems", &params);
    if let Err(e) = check_key(&params) {
        return e.into_response();
    }
    if params.get("playlistId").map(String::as_str) != Some(UPLOADS_PLAYLIST) {
        return google_error(StatusCode::NOT_FOUND, "The playlist identified with the request's playlistId parameter cannot be found.")
            .into_response();
    }

    let item = |id: &str, title: &str, age_days: i64| {
        json!({
            "kind": "youtube#playlistItem",
            "snippet": {
                "title": title,
                "publishedAt": (Utc::now() - Duration::days(age_days)).to_rfc3339(),
            },
            "contentDetails": {"videoId": id}
        })
    };

    let max: usize = params
        .get("maxResults")
        .and_then(|m| m.parse().ok())
        .unwrap_or(5);
    let (items, next) = match params.get("pageToken").map(String::as_str) {
        None => (
            vec![item("vid1", "Recent and long", 1), item("vid2", "Recent but short", 2)],
            Some("PAGE2"),
        ),
        Some("PAGE2") => (vec![item("vid3", "Old and long", 45)], None),
        Some(_) => (vec![], None),
    };
    let items: Vec<Value> = items.into_iter().take(max).collect();

    list("youtube#playlistItemListResponse", items, next).into_response()
}

fn video(id: &str) -> Option<Value> {
    let (title, duration, views) = match id {
        "vid1" => ("Recent and long", "PT12M30S", "1500"),
        "vid2" => ("Recent but short", "PT45S", "90000"),
        "vid3" => ("Old and long", "PT1H", "7000"),
        "dQw4w9WgXcQ" => ("Never Gonna Give You Up", "PT3M33S", "1500000000"),
        "jNQXAC9IVRw" => ("Me at the zoo", "PT19S", "300000000"),
        _ => return None,
    };
    Some(json!({
        "kind": "youtube#video",
        "id": id,
        "snippet": {
            "publishedAt": "2024-01-01T00:00:00Z",
            "channelId": CHANNEL_ID,
            "channelTitle": CHANNEL_TITLE,
            "title": title,
            "description": format!("{} description", title),
            "thumbnails": {"default": {"url": format!("https://i.ytimg.com/vi/{}/default.jpg", id), "width": 120, "height": 90}}
        },
        "contentDetails": {"duration": duration, "definition": "hd"},
        "statistics": {"viewCount": views, "likeCount": "10", "commentCount": "2"}
    }))
}

async fn videos(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record("videos", &params);
    if let Err(e) = check_key(&params) {
        return e.into_response();
    }

    // Unknown IDs are silently dropped, like the real API does
    let items: Vec<Value> = params
        .get("id")
        .map(|ids| ids.split(',').filter_map(video).collect())
        .unwrap_or_default();

    list("youtube#videoListResponse", items, None).into_response()
}

async fn comment_threads(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record("commentThreads", &params);
    if let Err(e) = check_key(&params) {
        return e.into_response();
    }
    if params.get("videoId").map(String::as_str) == Some("disabled") {
        return google_error(
            StatusCode::FORBIDDEN,
            "The video identified by the videoId parameter has disabled comments.",
        )
        .into_response();
    }

    let thread = |n: usize| {
        json!({
            "kind": "youtube#commentThread",
            "id": format!("thread{}", n),
            "snippet": {
                "topLevelComment": {
                    "id": format!("thread{}", n),
                    "snippet": {
                        "authorDisplayName": format!("@user{}", n),
                        "textDisplay": format!("comment {}", n),
                        "likeCount": n,
                        "publishedAt": "2024-01-02T03:04:05Z"
                    }
                }
            }
        })
    };

    let max: usize = params
        .get("maxResults")
        .and_then(|m| m.parse().ok())
        .unwrap_or(20);
    let (range, next) = match params.get("pageToken").map(String::as_str) {
        None => (0..3, Some("C2")),
        Some("C2") => (3..5, None),
        Some(_) => (0..0, None),
    };
    let items: Vec<Value> = range.map(thread).take(max).collect();

    list("youtube#commentThreadListResponse", items, next).into_response()
}

async fn broken() -> impl IntoResponse {
    (StatusCode::OK, "<html>not json</html>")
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/channels", get(channels))
        .route("/playlistItems", get(playlist_items))
        .route("/videos", get(videos))
        .route("/commentThreads", get(comment_threads))
        .route("/broken/videos", get(broken))
        .with_state(state)
}

/// Serves `router` on 127.0.0.1 and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind mock server");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Mock server failed");
    });
    format!("http://{}", addr)
}

/// Starts the YouTube mock and returns its base URL and request log.
pub async fn youtube_mock() -> (String, MockState) {
    let state = MockState::default();
    let base = serve(router(state.clone())).await;
    (base, state)
}
