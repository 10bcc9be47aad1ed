//! Keeps HubSpot contacts' YouTube view averages fresh.
//!
//! Contacts carry a `youtube_handle` property (handle, channel URL or channel
//! ID). For every contact whose `last_updated_youtube_video_average_views` is
//! missing or older than the stale window, the 30-day average is recomputed
//! and written back, rounded to the nearest hundred.

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    client::YouTubeClient,
    config::{self, ConfigError},
    stats,
    util::{HttpClient, HttpError},
};

pub const HUBSPOT_API_BASE: &str = "https://api.hubapi.com";
pub const TOKEN_VAR: &str = "HUBSPOT_PRIVATE_APP_TOKEN";

pub const PROP_AVG_VIEWS: &str = "youtube_video_average_views";
pub const PROP_LAST_UPDATED: &str = "last_updated_youtube_video_average_views";
pub const PROP_CHANNEL_IDENTIFIER: &str = "youtube_handle";

const TIMEOUT: Duration = Duration::from_secs(20);
const MAX_SEARCH_PAGE: usize = 1000;

#[derive(thiserror::Error, Debug)]
pub enum HubSpotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HubSpot request failed: {0}")]
    Http(#[from] HttpError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub stale_days: i64,
    pub min_duration_minutes: u32,
    pub fetch_count: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            stale_days: 30,
            min_duration_minutes: stats::DEFAULT_MIN_MINUTES,
            fetch_count: stats::DEFAULT_FETCH_COUNT,
        }
    }
}

impl SyncSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            stale_days: config::number_var("YOUTUBE_AVG_STALE_DAYS", defaults.stale_days)?,
            min_duration_minutes: config::number_var(
                "YOUTUBE_MIN_DURATION_MINUTES",
                defaults.min_duration_minutes,
            )?,
            fetch_count: config::number_var("YOUTUBE_FETCH_COUNT", defaults.fetch_count)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, Option<String>>,
}

impl Contact {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(|v| v.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Contact>,
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    after: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub found: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct HubSpotClient {
    http: HttpClient,
    token: String,
    base_url: String,
}

impl HubSpotClient {
    pub fn new(token: impl Into<String>) -> Result<Self, HubSpotError> {
        let token = config::non_empty(Some(token.into())).ok_or(ConfigError::MissingVar(TOKEN_VAR))?;
        let http = HttpClient::with_timeout(TIMEOUT).map_err(HttpError::from)?;

        Ok(Self {
            http,
            token,
            base_url: HUBSPOT_API_BASE.to_string(),
        })
    }

    pub fn from_env() -> Result<Self, HubSpotError> {
        Self::new(config::require_var(TOKEN_VAR)?)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Contacts that have a channel identifier and a missing or stale
    /// average, up to `limit` of them.
    pub async fn search_contacts_needing_update(
        &self,
        limit: usize,
        stale_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Contact>, HubSpotError> {
        let url = format!("{}/crm/v3/objects/contacts/search", self.base_url);
        let mut contacts: Vec<Contact> = Vec::new();
        let mut after: Option<String> = None;

        while contacts.len() < limit {
            let mut payload = json!({
                "filterGroups": [{
                    "filters": [{
                        "propertyName": PROP_CHANNEL_IDENTIFIER,
                        "operator": "HAS_PROPERTY",
                    }]
                }],
                "properties": [
                    PROP_AVG_VIEWS,
                    PROP_LAST_UPDATED,
                    PROP_CHANNEL_IDENTIFIER,
                    "firstname",
                    "lastname",
                    "email",
                ],
                "limit": (limit - contacts.len()).min(MAX_SEARCH_PAGE),
            });
            if let Some(after) = &after {
                payload["after"] = json!(after);
            }

            debug!("POST {} after={:?}", url, after);
            let request = self
                .http
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&payload);
            let page: SearchResponse = self.http.send_json(request).await?;

            for contact in page.results {
                if !is_stale_or_missing(contact.property(PROP_LAST_UPDATED), stale_days, now) {
                    continue;
                }
                if contacts.iter().all(|c| c.id != contact.id) {
                    contacts.push(contact);
                }
            }

            after = page.paging.and_then(|p| p.next).map(|n| n.after);
            if after.is_none() {
                break;
            }
        }
        contacts.truncate(limit);

        Ok(contacts)
    }

    pub async fn update_contact_properties(
        &self,
        contact_id: &str,
        properties: &HashMap<&str, String>,
    ) -> Result<(), HubSpotError> {
        let url = format!("{}/crm/v3/objects/contacts/{}", self.base_url, contact_id);
        debug!("PATCH {}", url);

        let request = self
            .http
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "properties": properties }));
        self.http.send_empty(request).await?;

        Ok(())
    }

    /// Recomputes and writes averages for up to `limit` stale contacts.
    /// A failure on one contact is logged and does not stop the run.
    pub async fn sync(
        &self,
        youtube: &YouTubeClient,
        limit: usize,
        settings: &SyncSettings,
    ) -> Result<SyncReport, HubSpotError> {
        let now = Utc::now();
        let contacts = self
            .search_contacts_needing_update(limit, settings.stale_days, now)
            .await?;
        info!("Found {} contact(s) needing update", contacts.len());

        let mut report = SyncReport {
            found: contacts.len(),
            ..Default::default()
        };

        for contact in &contacts {
            let Some(identifier) = contact.property(PROP_CHANNEL_IDENTIFIER) else {
                info!("[skip] contact {}: no {}", contact.id, PROP_CHANNEL_IDENTIFIER);
                report.skipped += 1;
                continue;
            };
            debug!(
                "contact {} email={:?} {}='{}' last_updated={:?}",
                contact.id,
                contact.property("email"),
                PROP_CHANNEL_IDENTIFIER,
                identifier,
                contact.property(PROP_LAST_UPDATED)
            );

            let avg = match stats::avg_views_last_30d(
                youtube,
                identifier,
                settings.min_duration_minutes,
                settings.fetch_count,
            )
            .await
            {
                Ok(avg) => avg,
                Err(e) => {
                    error!(
                        "contact {}: failed to compute avg for '{}': {}",
                        contact.id, identifier, e
                    );
                    report.failed += 1;
                    continue;
                }
            };

            let rounded = round_to_hundreds(avg);
            let properties = HashMap::from([
                (PROP_AVG_VIEWS, format!("{:.0}", rounded)),
                (PROP_LAST_UPDATED, midnight_utc(now)),
            ]);

            match self.update_contact_properties(&contact.id, &properties).await {
                Ok(()) => {
                    info!(
                        "[ok] contact {} ({:?}) channel='{}' avg={:.0}",
                        contact.id,
                        contact.property("email"),
                        identifier,
                        rounded
                    );
                    report.updated += 1;
                }
                Err(e) => {
                    error!("contact {}: failed to update HubSpot: {}", contact.id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

pub fn round_to_hundreds(value: f64) -> f64 {
    (value / 100.0).round_ties_even() * 100.0
}

/// Today at 00:00 UTC, in the form HubSpot accepts for date properties.
pub fn midnight_utc(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT00:00:00Z").to_string()
}

/// HubSpot hands dates back as RFC 3339, plain dates, or epoch milliseconds.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    None
}

/// Missing or unparseable values are stale.
pub fn is_stale_or_missing(value: Option<&str>, stale_days: i64, now: DateTime<Utc>) -> bool {
    let Some(updated) = value.and_then(parse_timestamp) else {
        return true;
    };
    updated < now - chrono::Duration::days(stale_days)
}
