//! Slug to event resolution.
//!
//! A slug either embeds the event id after a `--` separator, in which case
//! the event is fetched directly, or it is a canonical name-and-date slug,
//! in which case the sport's events are paged through until one matches.

use serde_json::Value;
use url::Url;

use super::inventory::{InventoryProxy, ALL_EVENTS_ORIGIN, ORIGIN_PARAM};
use super::xs2::Params;
use crate::models::EventRecord;
use crate::utils::error::AppError;

/// Hard ceiling on upstream pages scanned for one slug.
pub const MAX_RESOLUTION_PAGES: usize = 20;

const RESOLUTION_PAGE_SIZE: &str = "50";
const ID_SEPARATOR: &str = "--";
const MIN_EMBEDDED_ID_LEN: usize = 6;

/// Lowercase ASCII slug: runs of anything that is not a letter or digit
/// collapse into one dash; common Latin accents are folded first.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        let folded = fold_accent(c);
        match folded {
            Some(ascii) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push_str(ascii);
            }
            None => pending_dash = true,
        }
    }

    slug
}

fn fold_accent(c: char) -> Option<&'static str> {
    const ASCII: [&str; 36] = [
        "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "a", "b", "c", "d", "e", "f", "g", "h",
        "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
    ];

    match c {
        '0'..='9' => Some(ASCII[(c as u8 - b'0') as usize]),
        'a'..='z' => Some(ASCII[(c as u8 - b'a') as usize + 10]),
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => Some("a"),
        'æ' => Some("ae"),
        'ç' | 'č' | 'ć' => Some("c"),
        'è' | 'é' | 'ê' | 'ë' | 'ě' => Some("e"),
        'ì' | 'í' | 'î' | 'ï' => Some("i"),
        'ñ' | 'ń' => Some("n"),
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => Some("o"),
        'ù' | 'ú' | 'û' | 'ü' => Some("u"),
        'ý' | 'ÿ' => Some("y"),
        'š' | 'ś' => Some("s"),
        'ß' => Some("ss"),
        'ž' | 'ź' | 'ż' => Some("z"),
        'ł' => Some("l"),
        _ => None,
    }
}

/// Slug generated for an event without its id: name plus start date.
pub fn canonical_slug(event: &EventRecord) -> String {
    match event.start_date() {
        Some(date) => slugify(&format!("{} {}", event.name, date)),
        None => slugify(&event.name),
    }
}

/// Slug used in links, carrying the id so resolution is a single fetch.
pub fn link_slug(event: &EventRecord) -> String {
    format!("{}{ID_SEPARATOR}{}", slugify(&event.name), event.event_id)
}

/// Returns the event id embedded after the last `--`, if the tail looks
/// like one.
pub fn extract_event_id(slug: &str) -> Option<&str> {
    let (_, tail) = slug.rsplit_once(ID_SEPARATOR)?;
    let looks_like_id = tail.len() >= MIN_EMBEDDED_ID_LEN
        && tail.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    looks_like_id.then_some(tail)
}

/// Turns an upstream pagination cursor into the parameters of the next
/// request, always with the all-events marker set.
///
/// Accepts absolute URLs, relative paths, raw query strings and bare page
/// numbers. Returns `None` when the cursor cannot be followed.
pub fn cursor_params(cursor: &Value, current: &Params) -> Option<Params> {
    let mut params = match cursor {
        Value::Number(page) => with_page(current, page.to_string()),
        Value::String(raw) => parse_cursor(raw.trim(), current)?,
        _ => return None,
    };

    params.insert(ORIGIN_PARAM.to_string(), ALL_EVENTS_ORIGIN.to_string());
    Some(params)
}

fn with_page(current: &Params, page: String) -> Params {
    let mut params = current.clone();
    params.insert("page".to_string(), page);
    params
}

fn parse_cursor(raw: &str, current: &Params) -> Option<Params> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(page) = raw.parse::<u32>() {
        return Some(with_page(current, page.to_string()));
    }

    let params = if raw.starts_with("http://") || raw.starts_with("https://") {
        match Url::parse(raw) {
            Ok(url) => url.query_pairs().into_owned().collect(),
            Err(e) => {
                tracing::debug!(cursor = raw, error = %e, "Malformed cursor URL, parsing query only");
                parse_query(raw.split_once('?').map_or("", |(_, q)| q))
            }
        }
    } else if raw.starts_with('/') {
        let (_, query) = raw.split_once('?')?;
        parse_query(query)
    } else {
        parse_query(raw.trim_start_matches('?'))
    };

    (!params.is_empty()).then_some(params)
}

fn parse_query(query: &str) -> Params {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Resolves a display slug to an event.
///
/// `sport_type` is only needed when the slug carries no id.
pub async fn resolve_event(
    proxy: &InventoryProxy,
    sport_type: Option<&str>,
    slug: &str,
) -> Result<Option<EventRecord>, AppError> {
    let slug = slug.trim().trim_matches('/');
    if slug.is_empty() {
        return Err(AppError::ValidationError("slug is required".into()));
    }

    let sport_type = sport_type.map(str::trim).filter(|s| !s.is_empty());

    if let Some(event_id) = extract_event_id(slug) {
        if let Some(event) = proxy.event(event_id).await? {
            tracing::debug!(%slug, event_id, "Slug resolved by embedded id");
            return Ok(Some(event));
        }
        if sport_type.is_none() {
            tracing::debug!(%slug, event_id, "Embedded id unknown upstream");
            return Ok(None);
        }
    }

    let sport_type = sport_type.ok_or_else(|| {
        AppError::ValidationError("sport_type is required to resolve this slug".into())
    })?;

    let wanted = slug.to_lowercase();
    let mut params = Params::from([
        ("sport_type".to_string(), sport_type.to_string()),
        ("page_size".to_string(), RESOLUTION_PAGE_SIZE.to_string()),
        (ORIGIN_PARAM.to_string(), ALL_EVENTS_ORIGIN.to_string()),
    ]);

    for scanned in 1..=MAX_RESOLUTION_PAGES {
        let page = proxy.events(&params).await?;
        if page.events.is_empty() {
            break;
        }

        if let Some(event) = page
            .events
            .iter()
            .find(|event| canonical_slug(event) == wanted || link_slug(event).to_lowercase() == wanted)
        {
            tracing::debug!(%slug, event_id = %event.event_id, scanned, "Slug resolved by scan");
            return Ok(Some(event.clone()));
        }

        match page.next_cursor().and_then(|cursor| cursor_params(cursor, &params)) {
            Some(next) if next != params => params = next,
            _ => break,
        }

        if scanned == MAX_RESOLUTION_PAGES {
            tracing::warn!(%slug, sport_type, "Slug resolution hit the page ceiling");
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, name: &str, date: Option<&str>) -> EventRecord {
        let mut value = json!({"event_id": id, "name": name});
        if let Some(date) = date {
            value["date_start"] = json!(date);
        }
        EventRecord::from_upstream(&value).unwrap()
    }

    #[test]
    fn slugify_collapses_and_folds() {
        assert_eq!(slugify("Real Madrid vs. FC Barcelona"), "real-madrid-vs-fc-barcelona");
        assert_eq!(slugify("  Atlético -- Müller!! "), "atletico-muller");
        assert_eq!(slugify("Grand Prix 2026"), "grand-prix-2026");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn canonical_slug_appends_date() {
        let event = record("e1", "Champions League Final", Some("2026-05-30T21:00:00"));
        assert_eq!(canonical_slug(&event), "champions-league-final-2026-05-30");

        let undated = record("e2", "Friendly", None);
        assert_eq!(canonical_slug(&undated), "friendly");
    }

    #[test]
    fn link_slug_round_trips_the_id() {
        let event = record("a1b2c3d4e5_spp", "Derby Day", None);
        let slug = link_slug(&event);
        assert_eq!(slug, "derby-day--a1b2c3d4e5_spp");
        assert_eq!(extract_event_id(&slug), Some("a1b2c3d4e5_spp"));
    }

    #[test]
    fn short_or_odd_tails_are_not_ids() {
        assert_eq!(extract_event_id("derby-day"), None);
        assert_eq!(extract_event_id("derby--abc"), None);
        assert_eq!(extract_event_id("derby--abc-def-ghi"), None);
    }

    #[test]
    fn cursor_forms_all_normalize() {
        let current = Params::new();
        let absolute = cursor_params(
            &json!("https://api.xs2event.com/v1/events?sport_type=football&page=2"),
            &current,
        )
        .unwrap();
        let relative = cursor_params(&json!("/v1/events?sport_type=football&page=2"), &current).unwrap();
        let raw = cursor_params(&json!("?sport_type=football&page=2"), &current).unwrap();

        assert_eq!(absolute, relative);
        assert_eq!(relative, raw);
        assert_eq!(raw["page"], "2");
        assert_eq!(raw[ORIGIN_PARAM], ALL_EVENTS_ORIGIN);
    }

    #[test]
    fn malformed_url_falls_back_to_query_parsing() {
        let params = cursor_params(&json!("https://[bad-host/events?page=3"), &Params::new()).unwrap();
        assert_eq!(params["page"], "3");
        assert_eq!(params[ORIGIN_PARAM], ALL_EVENTS_ORIGIN);
    }

    #[test]
    fn unparseable_relative_cursor_stops() {
        assert_eq!(cursor_params(&json!("/v1/events"), &Params::new()), None);
        assert_eq!(cursor_params(&json!(""), &Params::new()), None);
        assert_eq!(cursor_params(&Value::Null, &Params::new()), None);
    }

    #[test]
    fn numeric_cursor_keeps_current_filters() {
        let current = Params::from([("sport_type".to_string(), "tennis".to_string())]);
        let next = cursor_params(&json!(4), &current).unwrap();
        assert_eq!(next["sport_type"], "tennis");
        assert_eq!(next["page"], "4");
    }

    #[test]
    fn page_number_string_cursor_keeps_current_filters() {
        let current = Params::from([
            ("sport_type".to_string(), "tennis".to_string()),
            ("page_size".to_string(), "50".to_string()),
        ]);
        let next = cursor_params(&json!(" 3 "), &current).unwrap();
        assert_eq!(next["sport_type"], "tennis");
        assert_eq!(next["page_size"], "50");
        assert_eq!(next["page"], "3");
        assert_eq!(next[ORIGIN_PARAM], ALL_EVENTS_ORIGIN);
        assert!(!next.contains_key("3"));
    }
}
