use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source tag stamped on every record that came out of a provider search.
pub const AI_SOURCE: &str = "gemini_search";

/// A stored hackathon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hackathon {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub organizer: String,
    pub registration_deadline: String,
    pub event_date: String,
    pub prize_pool: String,
    pub website_url: String,
    pub platform: Platform,
    pub status: HackathonStatus,
    pub tags: Vec<String>,
    pub eligibility: String,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source: String,
}

/// A normalized record that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewHackathon {
    pub title: String,
    pub description: String,
    pub organizer: String,
    pub registration_deadline: String,
    pub event_date: String,
    pub prize_pool: String,
    pub website_url: String,
    pub platform: Platform,
    pub status: HackathonStatus,
    pub tags: Vec<String>,
    pub eligibility: String,
    pub scraped_at: DateTime<Utc>,
    pub source: String,
}

impl NewHackathon {
    pub fn natural_key(&self) -> String {
        natural_key(&self.title, &self.organizer)
    }
}

/// De-duplication key: title and organizer, case and whitespace insensitive.
pub fn natural_key(title: &str, organizer: &str) -> String {
    format!("{}|{}", fold(title), fold(organizer))
}

fn fold(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Unstop,
    Devfolio,
    Hackerearth,
    Mlh,
    #[default]
    Other,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Unstop,
        Platform::Devfolio,
        Platform::Hackerearth,
        Platform::Mlh,
        Platform::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Unstop => "unstop",
            Platform::Devfolio => "devfolio",
            Platform::Hackerearth => "hackerearth",
            Platform::Mlh => "mlh",
            Platform::Other => "other",
        }
    }

    /// Lenient match used for provider output: accepts exact names, display
    /// names like "HackerEarth" or "Major League Hacking", and URLs.
    pub fn detect(raw: &str) -> Option<Platform> {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if let Ok(p) = lower.parse() {
            return Some(p);
        }
        if lower.contains("unstop") {
            Some(Platform::Unstop)
        } else if lower.contains("devfolio") {
            Some(Platform::Devfolio)
        } else if lower.contains("hackerearth") || lower.contains("hacker earth") {
            Some(Platform::Hackerearth)
        } else if lower.contains("mlh") || lower.contains("major league hacking") {
            Some(Platform::Mlh)
        } else {
            None
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unstop" => Ok(Platform::Unstop),
            "devfolio" => Ok(Platform::Devfolio),
            "hackerearth" => Ok(Platform::Hackerearth),
            "mlh" => Ok(Platform::Mlh),
            "other" => Ok(Platform::Other),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HackathonStatus {
    Open,
    Closed,
    #[default]
    Upcoming,
}

impl HackathonStatus {
    pub const ALL: [HackathonStatus; 3] = [
        HackathonStatus::Open,
        HackathonStatus::Closed,
        HackathonStatus::Upcoming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HackathonStatus::Open => "open",
            HackathonStatus::Closed => "closed",
            HackathonStatus::Upcoming => "upcoming",
        }
    }
}

impl fmt::Display for HackathonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HackathonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(HackathonStatus::Open),
            "closed" => Ok(HackathonStatus::Closed),
            "upcoming" => Ok(HackathonStatus::Upcoming),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Fields editable through the update form. `status: None` means "derive
/// from the dates".
#[derive(Debug, Clone, PartialEq)]
pub struct HackathonUpdate {
    pub title: String,
    pub description: String,
    pub organizer: String,
    pub registration_deadline: String,
    pub event_date: String,
    pub prize_pool: String,
    pub website_url: String,
    pub platform: Platform,
    pub status: Option<HackathonStatus>,
    pub tags: Vec<String>,
    pub eligibility: String,
}

/// Raw edit form as posted by the browser (`application/x-www-form-urlencoded`)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct HackathonForm {
    pub title: String,
    pub description: String,
    pub organizer: String,
    pub registration_deadline: String,
    pub event_date: String,
    pub prize_pool: String,
    pub website_url: String,
    pub platform: String,
    pub status: String,
    /// Comma-separated
    pub tags: String,
    pub eligibility: String,
}

impl HackathonForm {
    /// Validate and convert. Only the title is required; an unknown platform
    /// becomes `other` and a blank or unknown status is derived from dates.
    pub fn into_update(self) -> Result<HackathonUpdate, String> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        Ok(HackathonUpdate {
            title,
            description: self.description.trim().to_string(),
            organizer: self.organizer.trim().to_string(),
            registration_deadline: crate::normalize::normalize_date(&self.registration_deadline),
            event_date: crate::normalize::normalize_date(&self.event_date),
            prize_pool: self.prize_pool.trim().to_string(),
            website_url: self.website_url.trim().to_string(),
            platform: Platform::detect(&self.platform).unwrap_or_default(),
            status: self.status.parse().ok(),
            tags: crate::normalize::dedup_tags(self.tags.split(',').map(str::to_string)),
            eligibility: self.eligibility.trim().to_string(),
        })
    }
}

impl From<&Hackathon> for HackathonForm {
    fn from(h: &Hackathon) -> Self {
        Self {
            title: h.title.clone(),
            description: h.description.clone(),
            organizer: h.organizer.clone(),
            registration_deadline: h.registration_deadline.clone(),
            event_date: h.event_date.clone(),
            prize_pool: h.prize_pool.clone(),
            website_url: h.website_url.clone(),
            platform: h.platform.to_string(),
            status: h.status.to_string(),
            tags: h.tags.join(", "),
            eligibility: h.eligibility.clone(),
        }
    }
}

/// Listing filters, shared by the HTML page and the JSON API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    #[serde(default, deserialize_with = "lenient_choice")]
    pub platform: Option<Platform>,
    #[serde(default, deserialize_with = "lenient_choice")]
    pub status: Option<HackathonStatus>,
    /// Free-text match against title, description, organizer and tags
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Query strings from the filter form send `platform=` for "any". Unknown
/// values are treated the same way so a mistyped link still lists records.
fn lenient_choice<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|s| s.trim().parse().ok()))
}

/// Search request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Search response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeResponse {
    pub success: bool,
    pub count: usize,
    pub created: usize,
    pub updated: usize,
    pub dropped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            created: 0,
            updated: 0,
            dropped: 0,
            error: Some(error.into()),
        }
    }
}

/// Generic `{"success": ..}` body used by delete and error paths
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the most recent search, shown on the listing page
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeSummary {
    pub query: String,
    pub finished_at: DateTime<Utc>,
    pub created: usize,
    pub updated: usize,
    pub dropped: usize,
    pub error: Option<String>,
}
