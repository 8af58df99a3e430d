//! XML sitemaps for search engines.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;

use super::resolution::slugify;
use crate::models::{SitemapEntry, SitemapKind};

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Child sitemaps listed by the index, in order.
pub const CHILD_SITEMAPS: &[&str] = &[
    "sitemap-static.xml",
    "sitemap-events.xml",
    "sitemap-tournaments.xml",
    "sitemap-teams.xml",
    "sitemap-venues.xml",
];

/// Pages that exist regardless of catalog contents.
const STATIC_PATHS: &[(&str, &str)] = &[
    ("", "1.0"),
    ("/events", "0.9"),
    ("/tournaments", "0.8"),
    ("/teams", "0.8"),
    ("/venues", "0.7"),
    ("/cart", "0.3"),
];

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn lastmod(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn sitemap_index(base_url: &str, now: DateTime<Utc>) -> String {
    let mut xml = format!("{XML_HEADER}\n<sitemapindex xmlns=\"{SITEMAP_NS}\">\n");
    for child in CHILD_SITEMAPS {
        let _ = writeln!(
            xml,
            "  <sitemap><loc>{}</loc><lastmod>{}</lastmod></sitemap>",
            escape_xml(&format!("{base_url}/{child}")),
            lastmod(now)
        );
    }
    xml.push_str("</sitemapindex>\n");
    xml
}

fn urlset<'a>(urls: impl Iterator<Item = (String, Option<String>, Option<&'a str>)>) -> String {
    let mut xml = format!("{XML_HEADER}\n<urlset xmlns=\"{SITEMAP_NS}\">\n");
    for (loc, modified, priority) in urls {
        xml.push_str("  <url><loc>");
        xml.push_str(&escape_xml(&loc));
        xml.push_str("</loc>");
        if let Some(modified) = modified {
            let _ = write!(xml, "<lastmod>{modified}</lastmod>");
        }
        if let Some(priority) = priority {
            let _ = write!(xml, "<priority>{priority}</priority>");
        }
        xml.push_str("</url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn static_urlset(base_url: &str) -> String {
    urlset(
        STATIC_PATHS
            .iter()
            .map(|(path, priority)| (format!("{base_url}{path}"), None, Some(*priority))),
    )
}

/// Path segment for an entry: its stored slug, or a slug built from its
/// name with the id appended so the page can always be resolved.
fn entry_slug(entry: &SitemapEntry) -> String {
    if let Some(slug) = entry.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return slug.trim_matches('/').to_string();
    }

    match entry.name.as_deref().map(slugify).filter(|s| !s.is_empty()) {
        Some(name) => format!("{name}--{}", entry.id),
        None => entry.id.clone(),
    }
}

pub fn entry_url(base_url: &str, kind: SitemapKind, entry: &SitemapEntry) -> String {
    let slug = entry_slug(entry);
    match kind {
        SitemapKind::Events => match entry.sport_type.as_deref().map(slugify).filter(|s| !s.is_empty()) {
            Some(sport) => format!("{base_url}/{sport}/events/{slug}"),
            None => format!("{base_url}/events/{slug}"),
        },
        SitemapKind::Tournaments => format!("{base_url}/tournaments/{slug}"),
        SitemapKind::Teams => format!("{base_url}/teams/{slug}"),
        SitemapKind::Venues => format!("{base_url}/venues/{slug}"),
    }
}

pub fn entries_urlset(base_url: &str, kind: SitemapKind, entries: &[SitemapEntry]) -> String {
    urlset(
        entries
            .iter()
            .map(|entry| (entry_url(base_url, kind, entry), Some(lastmod(entry.updated_at)), None)),
    )
}
