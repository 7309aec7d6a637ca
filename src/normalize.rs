use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::parser::RawItem;
use crate::registry::Source;
use crate::time_ago::{time_ago, RECENTLY};

/// Longest description kept before the ellipsis is appended, in characters.
pub const DESCRIPTION_LIMIT: usize = 250;
const ELLIPSIS: &str = "...";

/// A displayable entry from one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub source: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub time_ago: String,
    pub is_podcast: bool,
    pub artwork_url: Option<String>,
    /// Unix seconds, or 0 when the entry had no usable date
    pub timestamp: i64,
}

/// Converts a parsed entry into an [`Item`] for `source`, labelling its age
/// relative to `now`.
pub fn normalize(source: &Source, raw: RawItem, now: DateTime<Utc>) -> Item {
    // Dates at or before the epoch can't be told apart from "no date"
    let published = raw.published.filter(|dt| dt.timestamp() > 0);

    let (time_ago, timestamp) = match published {
        Some(dt) => (time_ago(now, dt), dt.timestamp()),
        None => (RECENTLY.to_string(), 0),
    };

    let description = truncate_description(&strip_markup(raw.summary.as_deref().unwrap_or("")));

    let artwork_url = if source.is_podcast {
        raw.image_href.or(raw.itunes_image_href)
    } else {
        None
    };

    Item {
        source: source.name.clone(),
        title: raw.title.unwrap_or_else(|| "Untitled".to_string()),
        description,
        link: raw.link.unwrap_or_else(|| "#".to_string()),
        time_ago,
        is_podcast: source.is_podcast,
        artwork_url,
        timestamp,
    }
}

/// Removes tag-like `<...>` runs from `text`.
///
/// A tag is a `<`, at least one character that isn't `<`, then the first `>`.
/// A `<` that doesn't open such a run is kept. Entities are not decoded.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match tag_len(after) {
            Some(len) => rest = &after[len..],
            None => {
                out.push('<');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Length in bytes of the tag body plus closing `>`, if `after` (the text
/// following a `<`) starts a tag.
fn tag_len(after: &str) -> Option<usize> {
    let mut chars = after.char_indices();
    let (_, first) = chars.next()?;
    if first == '<' {
        return None;
    }

    for (i, c) in chars {
        match c {
            '>' => return Some(i + 1),
            '<' => return None,
            _ => {}
        }
    }
    None
}

/// Cuts `text` to [`DESCRIPTION_LIMIT`] characters and appends `...` when it was longer.
pub fn truncate_description(text: &str) -> String {
    match text.char_indices().nth(DESCRIPTION_LIMIT) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
