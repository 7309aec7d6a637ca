use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::fetcher::FeedError;

/// Number of entries kept from each feed, in feed order.
pub const MAX_ITEMS_PER_SOURCE: usize = 10;

/// Date formats carrying an explicit UTC offset, tried after RFC 2822 / RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Date formats without an offset; these are taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d"];

/// One feed entry before normalization. Every field is optional; absence is
/// explicit rather than guessed at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    /// Publish date, falling back to the update date
    pub published: Option<DateTime<Utc>>,
    /// Entry-level `<image href="...">` (or `<image><url>`)
    pub image_href: Option<String>,
    /// Entry-level `<itunes:image href="...">`
    pub itunes_image_href: Option<String>,
}

/// Parses an RSS, Atom or JSON feed into at most [`MAX_ITEMS_PER_SOURCE`] raw items.
///
/// A document that cannot be parsed at all is a [`FeedError::Parse`]. Problems
/// confined to one field (an unreadable date, a missing title) only leave that
/// field empty.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RawItem>, FeedError> {
    let feed = parser::Builder::new()
        .timestamp_parser(parse_date)
        .build()
        .parse(bytes)
        .map_err(|e| FeedError::Parse(e.to_string()))?;

    let mut artwork = scan_artwork(bytes).into_iter();

    let items = feed
        .entries
        .into_iter()
        .take(MAX_ITEMS_PER_SOURCE)
        .map(|entry| RawItem::from_entry(entry, artwork.next().unwrap_or_default()))
        .collect();

    Ok(items)
}

impl RawItem {
    fn from_entry(entry: Entry, artwork: EntryArtwork) -> Self {
        let link = entry
            .links
            .iter()
            .filter(|l| !l.href.is_empty())
            .find(|l| {
                l.rel
                    .as_deref()
                    .map_or(true, |rel| rel.eq_ignore_ascii_case("alternate"))
            })
            .or_else(|| entry.links.iter().find(|l| !l.href.is_empty()))
            .map(|l| l.href.clone());

        Self {
            title: entry.title.map(|t| t.content),
            link,
            summary: entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body)),
            published: entry.published.or(entry.updated),
            image_href: artwork.image,
            itunes_image_href: artwork.itunes_image,
        }
    }
}

/// Parses the date formats found in syndication feeds.
///
/// Tries RFC 2822 (RSS), RFC 3339 (Atom), then the explicit format lists above.
/// Times without an offset are read as UTC. Returns `None` for anything else.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    // Some feeds publish a weekday that doesn't match the date
    if let Some((_, rest)) = input.split_once(", ") {
        if let Ok(dt) = DateTime::parse_from_rfc2822(rest) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    None
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EntryArtwork {
    image: Option<String>,
    itunes_image: Option<String>,
}

/// Collects artwork references for each `<item>`/`<entry>` in document order.
///
/// feed-rs doesn't surface these elements, so the raw XML is read separately.
/// A reader error ends the scan and keeps what was collected so far.
fn scan_artwork(bytes: &[u8]) -> Vec<EntryArtwork> {
    let mut reader = Reader::from_reader(bytes);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;

    let mut scan = ArtworkScan::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => scan.open(&e, false),
            Ok(Event::Empty(e)) => scan.open(&e, true),
            Ok(Event::Text(t)) => {
                if let Ok(text) = t.unescape() {
                    scan.text(&text);
                }
            }
            Ok(Event::CData(c)) => scan.text(&String::from_utf8_lossy(&c)),
            Ok(Event::End(e)) => scan.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("Artwork scan stopped at byte {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    scan.finish()
}

#[derive(Default)]
struct ArtworkScan {
    entries: Vec<EntryArtwork>,
    current: Option<EntryArtwork>,
    /// Open elements below the current entry
    depth: usize,
    in_image: bool,
    in_image_url: bool,
}

impl ArtworkScan {
    fn open(&mut self, element: &BytesStart, empty: bool) {
        let Some(current) = self.current.as_mut() else {
            if is_entry(element.local_name().as_ref()) {
                if empty {
                    self.entries.push(EntryArtwork::default());
                } else {
                    self.current = Some(EntryArtwork::default());
                    self.depth = 0;
                }
            }
            return;
        };

        // Inside an entry, a nested <item>/<entry> is just another child
        match element.name().as_ref() {
            b"image" => {
                if current.image.is_none() {
                    current.image = href(element);
                }
                self.in_image = !empty;
            }
            b"itunes:image" => {
                if current.itunes_image.is_none() {
                    current.itunes_image = href(element);
                }
            }
            b"url" if self.in_image && !empty => self.in_image_url = true,
            _ => {}
        }

        if !empty {
            self.depth += 1;
        }
    }

    fn text(&mut self, text: &str) {
        if !self.in_image_url {
            return;
        }
        let text = text.trim();
        if let Some(current) = self.current.as_mut() {
            if current.image.is_none() && !text.is_empty() {
                current.image = Some(text.to_string());
            }
        }
    }

    fn close(&mut self, name: &[u8]) {
        if self.current.is_none() {
            return;
        }

        if self.depth == 0 {
            if let Some(current) = self.current.take() {
                self.entries.push(current);
            }
            self.in_image = false;
            self.in_image_url = false;
            return;
        }
        self.depth -= 1;

        match name {
            b"image" => {
                self.in_image = false;
                self.in_image_url = false;
            }
            b"url" => self.in_image_url = false,
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<EntryArtwork> {
        if let Some(current) = self.current.take() {
            self.entries.push(current);
        }
        self.entries
    }
}

fn is_entry(local_name: &[u8]) -> bool {
    matches!(local_name, b"item" | b"entry")
}

fn href(element: &BytesStart) -> Option<String> {
    element
        .try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
