use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::ProviderError;
use crate::config::LlmConfig;

/// Error bodies echoed back to callers are cut to this many bytes.
const MAX_ERROR_BODY: usize = 500;

/// Ask the provider to search the web for hackathons matching `query`.
///
/// Returns the provider's raw text, which is expected (but not guaranteed)
/// to contain a JSON array of records. One request, no retries.
pub async fn search_hackathons(
    client: &reqwest::Client,
    config: &LlmConfig,
    query: &str,
    limit: usize,
) -> Result<String, ProviderError> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| ProviderError::MissingApiKey(config.provider.clone()))?;

    let prompt = build_search_prompt(query, limit, chrono::Utc::now().date_naive());

    tracing::info!(
        provider = %config.provider,
        model = %config.model,
        "Searching hackathons for query {query:?}"
    );

    let text = match config.provider.as_str() {
        "gemini" => call_gemini(client, config, api_key, &prompt).await?,
        "openai" => call_openai(client, config, api_key, &prompt).await?,
        other => return Err(ProviderError::UnknownProvider(other.to_string())),
    };

    if text.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    tracing::debug!("Provider returned {} bytes", text.len());
    Ok(text)
}

pub fn build_search_prompt(query: &str, limit: usize, today: chrono::NaiveDate) -> String {
    let query = query.replace('"', "'");
    format!(
        "Search the web for the top {limit} most POPULAR and current hackathons from platforms \
         like Unstop, Devfolio, HackerEarth, MLH and other hackathon platforms. Focus on \
         hackathons with high participation, good prizes and reputable organizers.\n\n\
         Query: \"{query}\"\n\
         Today's date: {today}\n\n\
         Return ONLY a valid JSON array (at most {limit} items) where each item has these keys:\n\
         [\n  {{\n\
         \x20   \"title\": \"Hackathon name\",\n\
         \x20   \"description\": \"One or two sentence summary\",\n\
         \x20   \"organizer\": \"Organizing company or community\",\n\
         \x20   \"registration_deadline\": \"YYYY-MM-DD\",\n\
         \x20   \"event_date\": \"YYYY-MM-DD\",\n\
         \x20   \"prize_pool\": \"Prize description\",\n\
         \x20   \"website_url\": \"Registration or info URL\",\n\
         \x20   \"platform\": \"unstop/devfolio/hackerearth/mlh/other\",\n\
         \x20   \"status\": \"open/closed/upcoming\",\n\
         \x20   \"tags\": [\"ai\", \"web3\"],\n\
         \x20   \"eligibility\": \"Who can participate\"\n\
         \x20 }}\n]\n\n\
         Rules:\n\
         - Only include hackathons that are currently open or upcoming.\n\
         - Sort by registration_deadline, latest first.\n\
         - Use an empty string for unknown values. Never invent URLs.\n\
         - Return only the JSON array, no additional text."
    )
}

/// Map a non-success HTTP status into the matching error.
async fn error_for_status(resp: reqwest::Response) -> ProviderError {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ProviderError::Auth {
            status: status.as_u16(),
        };
    }
    let body = resp.text().await.unwrap_or_default();
    ProviderError::Http {
        status: status.as_u16(),
        body: truncate_to_char_boundary(&body, MAX_ERROR_BODY).to_string(),
    }
}

fn truncate_to_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ─── Gemini ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    tools: Vec<GeminiTool>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

/// `{"google_search": {}}` enables grounding with Google Search.
#[derive(Serialize)]
struct GeminiTool {
    google_search: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

async fn call_gemini(
    client: &reqwest::Client,
    config: &LlmConfig,
    api_key: &str,
    prompt: &str,
) -> Result<String, ProviderError> {
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        config.base_url, config.model
    );

    let req = GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: Some(prompt.to_string()),
            }],
        }],
        tools: vec![GeminiTool {
            google_search: serde_json::json!({}),
        }],
        generation_config: GeminiGenerationConfig {
            temperature: config.temperature,
        },
    };

    let resp = client
        .post(&url)
        .header("x-goog-api-key", api_key)
        .json(&req)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(error_for_status(resp).await);
    }

    let body: GeminiResponse = resp
        .json()
        .await
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;

    // Grounded answers are often split across several text parts.
    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    Ok(text)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    api_key: &str,
    prompt: &str,
) -> Result<String, ProviderError> {
    let url = format!("{}/v1/chat/completions", config.base_url);

    let req = OpenAiChatRequest {
        model: config.model.clone(),
        messages: vec![OpenAiMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        temperature: config.temperature,
    };

    let resp = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&req)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(error_for_status(resp).await);
    }

    let body: OpenAiChatResponse = resp
        .json()
        .await
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(ProviderError::EmptyResponse)
}
