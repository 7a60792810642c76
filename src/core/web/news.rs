use std::sync::{Arc, OnceLock};

use chrono::{DateTime, FixedOffset};
use quick_xml::de::from_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::WEB_TIMEOUT;
use crate::core::http::RemoteSource;

const SITE: &str = "https://mistxi.com";

pub const FEED_URLS: &[&str] = &[
    "https://mistxi.com/news/index.xml",
    "https://mistxi.com/news/index.xml/",
    "https://mistxi.com/index.xml",
    "https://mistxi.com/rss.xml",
];
pub const NEWS_PAGE_URL: &str = "https://mistxi.com/news/";

const SNIPPET_MAX_CHARS: usize = 220;

/// Newest post from the server's site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub title: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub url: Option<String>,
    pub summary: Option<String>,
}

// ── Feed models ──

#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

impl Text {
    fn non_empty(text: &Option<Text>) -> Option<String> {
        text.as_ref()
            .map(|t| t.value.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Option<RssChannel>,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<Text>,
    link: Option<Text>,
    description: Option<Text>,
    #[serde(rename = "pubDate")]
    pub_date: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<Text>,
    summary: Option<Text>,
    updated: Option<Text>,
    id: Option<Text>,
    #[serde(default)]
    link: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

/// First item of an RSS 2.0 or Atom document.
pub fn parse_feed(xml: &str) -> Option<Announcement> {
    if let Ok(rss) = from_str::<Rss>(xml) {
        if let Some(item) = rss.channel.and_then(|c| c.items.into_iter().next()) {
            if let Some(title) = Text::non_empty(&item.title) {
                return Some(Announcement {
                    title,
                    date: Text::non_empty(&item.pub_date)
                        .and_then(|d| DateTime::parse_from_rfc2822(&d).ok()),
                    url: Text::non_empty(&item.link),
                    summary: Text::non_empty(&item.description).and_then(|s| clean_snippet(&s)),
                });
            }
        }
    }

    let feed = from_str::<AtomFeed>(xml).ok()?;
    let entry = feed.entries.into_iter().next()?;
    let title = Text::non_empty(&entry.title)?;
    let url = entry
        .link
        .iter()
        .find_map(|l| l.href.clone())
        .or_else(|| Text::non_empty(&entry.id));
    Some(Announcement {
        title,
        date: Text::non_empty(&entry.updated).and_then(|d| DateTime::parse_from_rfc3339(&d).ok()),
        url,
        summary: Text::non_empty(&entry.summary).and_then(|s| clean_snippet(&s)),
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<.*?>").expect("Invalid tag regex"))
}

fn space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace regex"))
}

fn news_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)href="(/news/[^"]+)""#).expect("Invalid news link regex"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
            .expect("Invalid entity regex")
    })
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "sbquo" => '\u{201A}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "bdquo" => '\u{201E}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "lsaquo" => '\u{2039}',
        "rsaquo" => '\u{203A}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "bull" => '\u{2022}',
        "middot" => '\u{00B7}',
        "prime" => '\u{2032}',
        "Prime" => '\u{2033}',
        "dagger" => '\u{2020}',
        "Dagger" => '\u{2021}',
        "permil" => '\u{2030}',
        "trade" => '\u{2122}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "deg" => '\u{00B0}',
        "plusmn" => '\u{00B1}',
        "times" => '\u{00D7}',
        "divide" => '\u{00F7}',
        "frac12" => '\u{00BD}',
        "frac14" => '\u{00BC}',
        "frac34" => '\u{00BE}',
        "sect" => '\u{00A7}',
        "para" => '\u{00B6}',
        "cent" => '\u{00A2}',
        "pound" => '\u{00A3}',
        "euro" => '\u{20AC}',
        "yen" => '\u{00A5}',
        "iexcl" => '\u{00A1}',
        "iquest" => '\u{00BF}',
        "shy" => '\u{00AD}',
        "larr" => '\u{2190}',
        "rarr" => '\u{2192}',
        "uarr" => '\u{2191}',
        "darr" => '\u{2193}',
        "hearts" => '\u{2665}',
        "star" => '\u{2606}',
        "agrave" => 'à',
        "aacute" => 'á',
        "acirc" => 'â',
        "auml" => 'ä',
        "ccedil" => 'ç',
        "egrave" => 'è',
        "eacute" => 'é',
        "ecirc" => 'ê',
        "euml" => 'ë',
        "iacute" => 'í',
        "iuml" => 'ï',
        "ntilde" => 'ñ',
        "oacute" => 'ó',
        "ouml" => 'ö',
        "uacute" => 'ú',
        "uuml" => 'ü',
        "szlig" => 'ß',
        "Eacute" => 'É',
        _ => return None,
    };
    Some(c)
}

fn numeric_entity(body: &str) -> Option<char> {
    let code = match body.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => body.parse::<u32>().ok()?,
    };
    char::from_u32(code).filter(|c| *c != '\0')
}

/// HTML character references in a single pass; unknown ones stay as written.
fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let decoded = match body.strip_prefix('#') {
                Some(num) => numeric_entity(num),
                None => named_entity(body),
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Plain-text summary: tags stripped, whitespace collapsed, length capped.
fn clean_snippet(html: &str) -> Option<String> {
    let text = tag_re().replace_all(html, " ");
    let text = decode_entities(&text);
    let text = space_re().replace_all(&text, " ").trim().to_string();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() > SNIPPET_MAX_CHARS {
        let cut: String = text.chars().take(SNIPPET_MAX_CHARS).collect();
        return Some(format!("{}…", cut));
    }
    Some(text)
}

/// Last resort when no feed parses: first `/news/...` link on the listing page.
pub fn scrape_news_page(html: &str) -> Option<Announcement> {
    let rel = news_link_re().captures(html)?.get(1)?.as_str().to_string();
    let title_re = Regex::new(&format!(
        r#"(?i)href="{}"[^>]*>([^<]{{3,120}})<"#,
        regex::escape(&rel)
    ))
    .ok();
    let title = title_re
        .and_then(|re| re.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .unwrap_or_else(|| "Latest News".to_string());
    Some(Announcement {
        title,
        date: None,
        url: Some(format!("{}{}", SITE, rel)),
        summary: None,
    })
}

/// Fetches the latest site announcement.
#[derive(Clone)]
pub struct NewsClient {
    remote: Arc<dyn RemoteSource>,
}

impl NewsClient {
    pub fn new(remote: Arc<dyn RemoteSource>) -> Self {
        Self { remote }
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        match tokio::time::timeout(WEB_TIMEOUT, self.remote.get_text(url)).await {
            Ok(Ok(body)) => Some(body),
            Ok(Err(e)) => {
                debug!("News fetch {} failed: {}", url, e);
                None
            }
            Err(_) => {
                debug!("News fetch {} timed out", url);
                None
            }
        }
    }

    pub async fn latest(&self) -> Option<Announcement> {
        for url in FEED_URLS {
            if let Some(ann) = self.fetch(url).await.as_deref().and_then(parse_feed) {
                return Some(ann);
            }
        }
        let html = self.fetch(NEWS_PAGE_URL).await?;
        scrape_news_page(&html)
    }
}
