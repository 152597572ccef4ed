//! Server-rendered HTML pages.

use std::fmt::Write;

use uuid::Uuid;

use crate::models::{
    Hackathon, HackathonForm, HackathonStatus, ListFilter, Platform, ScrapeSummary,
};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 960px; padding: 1rem; color: #1f2933; }
header a { color: inherit; text-decoration: none; }
form.inline { display: flex; gap: .5rem; flex-wrap: wrap; margin: .75rem 0; }
input, select, textarea, button { font: inherit; padding: .35rem .5rem; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: .4rem; border-bottom: 1px solid #e4e7eb; vertical-align: top; }
.badge { border-radius: 4px; padding: 0 .35rem; font-size: .85em; background: #e4e7eb; }
.badge.open { background: #c6f7e2; } .badge.closed { background: #facdcd; } .badge.upcoming { background: #fff3c4; }
.notice { padding: .5rem .75rem; border-radius: 4px; background: #f0f4f8; }
.error { padding: .5rem .75rem; border-radius: 4px; background: #facdcd; }
label { display: block; margin-top: .6rem; font-weight: 600; }
label input, label select, label textarea { display: block; width: 100%; box-sizing: border-box; font-weight: normal; }
"#;

const SCRIPT: &str = r#"
async function runSearch(ev) {
  ev.preventDefault();
  const button = ev.target.querySelector('button');
  const status = document.getElementById('search-status');
  button.disabled = true;
  status.textContent = 'Searching…';
  try {
    const resp = await fetch('/scrape', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ query: ev.target.query.value }),
    });
    const body = await resp.json();
    if (body.success) { window.location.reload(); return; }
    status.textContent = 'Search failed: ' + (body.error || 'unknown error');
  } catch (e) {
    status.textContent = 'Search failed: ' + e;
  }
  button.disabled = false;
}
async function deleteHackathon(id) {
  if (!confirm('Delete this hackathon?')) return;
  const resp = await fetch('/delete/' + id, { method: 'POST' });
  const body = await resp.json();
  if (body.success) { window.location.href = '/'; } else { alert(body.error || 'Delete failed'); }
}
"#;

/// Escape text for use in element content and quoted attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Only http(s) links are rendered as anchors.
fn safe_href(url: &str) -> Option<String> {
    let lower = url.trim().to_lowercase();
    (lower.starts_with("https://") || lower.starts_with("http://")).then(|| escape(url.trim()))
}

fn or_dash(s: &str) -> String {
    if s.trim().is_empty() {
        "—".to_string()
    } else {
        escape(s)
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n<script>{SCRIPT}</script>\n</head>\n\
         <body>\n<header><h1><a href=\"/\">Hackathon Finder</a></h1></header>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn status_badge(status: HackathonStatus) -> String {
    format!("<span class=\"badge {s}\">{s}</span>", s = status.as_str())
}

fn options<T: Copy + PartialEq + std::fmt::Display>(
    all: &[T],
    selected: Option<T>,
    any_label: Option<&str>,
) -> String {
    let mut out = String::new();
    if let Some(label) = any_label {
        let _ = write!(out, "<option value=\"\">{}</option>", escape(label));
    }
    for item in all {
        let sel = if selected == Some(*item) { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{item}\"{sel}>{item}</option>");
    }
    out
}

pub fn index_page(
    hackathons: &[Hackathon],
    filter: &ListFilter,
    last_scrape: Option<&ScrapeSummary>,
    default_query: &str,
    error: Option<&str>,
) -> String {
    let mut body = String::new();

    if let Some(err) = error {
        let _ = write!(body, "<p class=\"error\">{}</p>", escape(err));
    }

    let _ = write!(
        body,
        "<form class=\"inline\" onsubmit=\"runSearch(event)\">\
         <input name=\"query\" size=\"50\" placeholder=\"{placeholder}\">\
         <button type=\"submit\">Search the web</button>\
         <span id=\"search-status\"></span></form>",
        placeholder = escape(default_query),
    );

    if let Some(summary) = last_scrape {
        let when = summary.finished_at.format("%Y-%m-%d %H:%M UTC");
        match &summary.error {
            Some(err) => {
                let _ = write!(
                    body,
                    "<p class=\"notice\">Last search “{}” at {when} failed: {}</p>",
                    escape(&summary.query),
                    escape(err)
                );
            }
            None => {
                let _ = write!(
                    body,
                    "<p class=\"notice\">Last search “{}” at {when}: {} new, {} updated, {} skipped</p>",
                    escape(&summary.query),
                    summary.created,
                    summary.updated,
                    summary.dropped
                );
            }
        }
    }

    let _ = write!(
        body,
        "<form class=\"inline\" method=\"get\" action=\"/\">\
         <input name=\"q\" value=\"{q}\" placeholder=\"Filter stored hackathons\">\
         <select name=\"platform\">{platforms}</select>\
         <select name=\"status\">{statuses}</select>\
         <button type=\"submit\">Filter</button></form>",
        q = escape(filter.q.as_deref().unwrap_or_default()),
        platforms = options(&Platform::ALL, filter.platform, Some("any platform")),
        statuses = options(&HackathonStatus::ALL, filter.status, Some("any status")),
    );

    if hackathons.is_empty() {
        body.push_str("<p>No hackathons stored yet. Run a search to find some.</p>");
        return layout("Hackathons", &body);
    }

    body.push_str(
        "<table><thead><tr><th>Title</th><th>Organizer</th><th>Platform</th>\
         <th>Deadline</th><th>Event</th><th>Status</th></tr></thead><tbody>",
    );
    for h in hackathons {
        let _ = write!(
            body,
            "<tr><td><a href=\"/hackathon/{id}\">{title}</a></td><td>{organizer}</td>\
             <td>{platform}</td><td>{deadline}</td><td>{event}</td><td>{status}</td></tr>",
            id = h.id,
            title = escape(&h.title),
            organizer = or_dash(&h.organizer),
            platform = h.platform,
            deadline = or_dash(&h.registration_deadline),
            event = or_dash(&h.event_date),
            status = status_badge(h.status),
        );
    }
    body.push_str("</tbody></table>");

    layout("Hackathons", &body)
}

pub fn detail_page(h: &Hackathon) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        "<h2>{title} {status}</h2><p>{description}</p><table>",
        title = escape(&h.title),
        status = status_badge(h.status),
        description = or_dash(&h.description),
    );

    let website = match safe_href(&h.website_url) {
        Some(href) => format!("<a href=\"{href}\" rel=\"noopener noreferrer\">{href}</a>"),
        None => or_dash(&h.website_url),
    };
    let tags = if h.tags.is_empty() {
        "—".to_string()
    } else {
        h.tags
            .iter()
            .map(|t| format!("<span class=\"badge\">{}</span>", escape(t)))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let rows = [
        ("Organizer", or_dash(&h.organizer)),
        ("Platform", h.platform.to_string()),
        ("Registration deadline", or_dash(&h.registration_deadline)),
        ("Event date", or_dash(&h.event_date)),
        ("Prize pool", or_dash(&h.prize_pool)),
        ("Eligibility", or_dash(&h.eligibility)),
        ("Website", website),
        ("Tags", tags),
        ("Found", h.scraped_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        ("Last updated", h.updated_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        ("Source", escape(&h.source)),
    ];
    for (label, value) in rows {
        let _ = write!(body, "<tr><th>{label}</th><td>{value}</td></tr>");
    }
    let _ = write!(
        body,
        "</table><p><a href=\"/edit/{id}\">Edit</a> · \
         <button type=\"button\" onclick=\"deleteHackathon('{id}')\">Delete</button> · \
         <a href=\"/\">Back</a></p>",
        id = h.id
    );

    layout(&h.title, &body)
}

pub fn edit_page(id: Uuid, form: &HackathonForm, error: Option<&str>) -> String {
    let mut body = String::new();
    let _ = write!(body, "<h2>Edit {}</h2>", escape(&form.title));
    if let Some(err) = error {
        let _ = write!(body, "<p class=\"error\">{}</p>", escape(err));
    }

    let _ = write!(body, "<form method=\"post\" action=\"/update/{id}\">");
    let text_fields = [
        ("title", "Title", &form.title),
        ("organizer", "Organizer", &form.organizer),
        (
            "registration_deadline",
            "Registration deadline (YYYY-MM-DD)",
            &form.registration_deadline,
        ),
        ("event_date", "Event date (YYYY-MM-DD)", &form.event_date),
        ("prize_pool", "Prize pool", &form.prize_pool),
        ("website_url", "Website", &form.website_url),
        ("tags", "Tags (comma separated)", &form.tags),
        ("eligibility", "Eligibility", &form.eligibility),
    ];
    for (name, label, value) in text_fields {
        let _ = write!(
            body,
            "<label>{label}<input name=\"{name}\" value=\"{value}\"></label>",
            value = escape(value)
        );
    }
    let _ = write!(
        body,
        "<label>Description<textarea name=\"description\" rows=\"4\">{}</textarea></label>",
        escape(&form.description)
    );

    let platform = Platform::detect(&form.platform);
    let status = form.status.parse::<HackathonStatus>().ok();
    let _ = write!(
        body,
        "<label>Platform<select name=\"platform\">{}</select></label>\
         <label>Status<select name=\"status\">{}</select></label>",
        options(&Platform::ALL, platform, None),
        options(&HackathonStatus::ALL, status, Some("derive from dates")),
    );
    let _ = write!(
        body,
        "<p><button type=\"submit\">Save</button> <a href=\"/hackathon/{id}\">Cancel</a></p></form>"
    );

    layout("Edit hackathon", &body)
}

pub fn error_page(message: &str) -> String {
    layout(
        "Error",
        &format!(
            "<p class=\"error\">{}</p><p><a href=\"/\">Back</a></p>",
            escape(message)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> Hackathon {
        Hackathon {
            id: Uuid::new_v4(),
            title: "<script>alert(1)</script>".to_string(),
            description: String::new(),
            organizer: "R&D".to_string(),
            registration_deadline: "2030-01-01".to_string(),
            event_date: String::new(),
            prize_pool: String::new(),
            website_url: "javascript:alert(1)".to_string(),
            platform: Platform::Mlh,
            status: HackathonStatus::Open,
            tags: vec!["ai".to_string()],
            eligibility: String::new(),
            scraped_at: Utc::now(),
            updated_at: Utc::now(),
            source: "gemini_search".to_string(),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_index_escapes_titles() {
        let page = index_page(&[sample()], &ListFilter::default(), None, "q", None);
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>alert(1)"));
        assert!(page.contains("R&amp;D"));
    }

    #[test]
    fn test_index_empty_state() {
        let page = index_page(&[], &ListFilter::default(), None, "q", None);
        assert!(page.contains("No hackathons stored yet"));
    }

    #[test]
    fn test_detail_does_not_link_non_http_urls() {
        let page = detail_page(&sample());
        assert!(!page.contains("href=\"javascript:"));
    }

    #[test]
    fn test_edit_preselects_platform() {
        let h = sample();
        let page = edit_page(h.id, &HackathonForm::from(&h), Some("Title is required"));
        assert!(page.contains("<option value=\"mlh\" selected>"));
        assert!(page.contains("Title is required"));
    }
}
