//! Turns loosely-typed provider output into [`NewHackathon`] records.
//!
//! Missing optional fields become empty defaults, dates are normalized to
//! `YYYY-MM-DD` when they parse, and entries without a title are dropped
//! individually without failing the batch.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm::ProviderError;
use crate::models::{HackathonStatus, NewHackathon, Platform, AI_SOURCE};

/// Why a single candidate was left out of a batch.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("entry {index} is not a JSON object")]
    NotAnObject { index: usize },
    #[error("entry {index} has no title")]
    MissingTitle { index: usize },
}

#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub records: Vec<NewHackathon>,
    pub dropped: Vec<ValidationError>,
    /// Valid records cut off by the result limit
    pub truncated: usize,
}

/// Locate and parse the JSON array in a provider reply. Accepts bare JSON,
/// markdown-fenced JSON, JSON surrounded by prose, and an object wrapping the
/// array under `hackathons` or `results`.
pub fn extract_json_array(text: &str) -> Result<Vec<Value>, ProviderError> {
    let stripped = strip_code_fence(text.trim());

    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        if let Some(items) = unwrap_array(value) {
            return Ok(items);
        }
    }

    if let (Some(start), Some(end)) = (stripped.find('['), stripped.rfind(']')) {
        if end > start {
            if let Ok(Value::Array(items)) = serde_json::from_str(&stripped[start..=end]) {
                return Ok(items);
            }
        }
    }

    if let (Some(start), Some(end)) = (stripped.find('{'), stripped.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&stripped[start..=end]) {
                if let Some(items) = unwrap_array(value) {
                    return Ok(items);
                }
            }
        }
    }

    let preview: String = stripped.chars().take(120).collect();
    Err(ProviderError::MalformedResponse(format!(
        "no JSON array found in reply: {preview}"
    )))
}

fn unwrap_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => ["hackathons", "results"]
            .iter()
            .find_map(|key| match obj.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }),
        _ => None,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let after = &text[start + 3..];
    // Skip a language tag such as "json"
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Normalize a parsed batch. Keeps at most `limit` valid records (in provider
/// order), then sorts them by registration deadline, latest first.
pub fn normalize_batch(values: Vec<Value>, now: DateTime<Utc>, limit: usize) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, value) in values.into_iter().enumerate() {
        match normalize_record(index, value, now) {
            Ok(record) => {
                if batch.records.len() < limit {
                    batch.records.push(record);
                } else {
                    batch.truncated += 1;
                }
            }
            Err(e) => {
                tracing::debug!("Dropping candidate: {e}");
                batch.dropped.push(e);
            }
        }
    }

    batch.records.sort_by(|a, b| {
        let da = parse_date(&a.registration_deadline);
        let db = parse_date(&b.registration_deadline);
        db.cmp(&da)
    });

    batch
}

pub fn normalize_record(
    index: usize,
    value: Value,
    now: DateTime<Utc>,
) -> Result<NewHackathon, ValidationError> {
    let Value::Object(obj) = value else {
        return Err(ValidationError::NotAnObject { index });
    };

    let title = string_field(&obj, &["title", "name"]);
    if title.is_empty() {
        return Err(ValidationError::MissingTitle { index });
    }

    let website_url = string_field(&obj, &["website_url", "url", "link"]);
    let registration_deadline =
        normalize_date(&string_field(&obj, &["registration_deadline", "end_date", "deadline"]));
    let event_date = normalize_date(&string_field(&obj, &["event_date", "start_date"]));

    let platform = Platform::detect(&string_field(&obj, &["platform"]))
        .or_else(|| Platform::detect(&website_url))
        .unwrap_or_default();

    let provider_status = string_field(&obj, &["status"]).parse().ok();
    let status = derive_status(
        &registration_deadline,
        &event_date,
        provider_status,
        now.date_naive(),
    );

    Ok(NewHackathon {
        title,
        description: string_field(&obj, &["description", "summary"]),
        organizer: string_field(&obj, &["organizer", "organiser", "host"]),
        registration_deadline,
        event_date,
        prize_pool: string_field(&obj, &["prize_pool", "prize", "prizes"]),
        website_url,
        platform,
        status,
        tags: obj.get("tags").map(parse_tags).unwrap_or_default(),
        eligibility: string_field(&obj, &["eligibility"]),
        scraped_at: now,
        source: AI_SOURCE.to_string(),
    })
}

/// First non-empty value among `keys`, coerced to a trimmed string.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .map(coerce_string)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(coerce_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => String::new(),
    }
}

/// Tags come back as an array or a comma-separated string.
pub fn parse_tags(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::Array(items) => items.iter().map(coerce_string).collect(),
        Value::String(s) => s.split(',').map(|t| t.to_string()).collect(),
        _ => Vec::new(),
    };
    dedup_tags(raw)
}

/// Trim, drop empties and remove repeats (case-insensitive), keeping the
/// first spelling seen.
pub fn dedup_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// Reformat to `YYYY-MM-DD` when the leading ten characters are a date;
/// otherwise keep the provider's text.
pub fn normalize_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.trim().to_string(),
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Status from dates: a future deadline means open, a past one closed; with
/// no deadline a future event is upcoming. Without usable dates the
/// provider's claim (or `upcoming`) stands.
pub fn derive_status(
    registration_deadline: &str,
    event_date: &str,
    fallback: Option<HackathonStatus>,
    today: NaiveDate,
) -> HackathonStatus {
    if let Some(deadline) = parse_date(registration_deadline) {
        return if deadline >= today {
            HackathonStatus::Open
        } else {
            HackathonStatus::Closed
        };
    }
    match parse_date(event_date) {
        Some(event) if event >= today => HackathonStatus::Upcoming,
        _ => fallback.unwrap_or_default(),
    }
}
